pub mod accessor;
pub mod decode;
