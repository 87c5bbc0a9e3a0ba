pub(crate) mod cipher;
pub(crate) mod signing;
