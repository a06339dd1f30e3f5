pub mod clock;
pub mod deepseek;
pub mod html;
pub mod similarity;
pub mod title;
pub mod url_norm;
