use std::sync::LazyLock;
use ustr::Ustr;

macro_rules! str_const {
    ($($name:ident = $str:literal);*; ) => {
        $(pub static $name: LazyLock<Ustr> = LazyLock::new(|| Ustr::from($str));)*
    };
}

// Opening keywords:
str_const! {
    LEMMA = "Lemma";
    THEOREM = "Theorem";
    COROLLARY = "Corollary";
}

// Closing keywords (without the trailing period):
str_const! {
    QED = "Qed";
    DEFINED = "Defined";
    ADMITTED = "Admitted";
    ABORT = "Abort";
}

pub const SECTION_OPEN: &str = "(** ** ";
pub const SECTION_CLOSE: &str = " *)";

pub const ALL_ROOTS: &str = "all";
pub const EXCLUDE_PREFIX: char = '+';

pub const CONFIG_FILE_NAME: &str = "lemma-deps.toml";
