pub(crate) mod speed;
pub(crate) mod window;
