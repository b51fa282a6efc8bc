/// simplelog set-up used by binaries and tests
pub mod logging;
