pub mod binding;
pub mod graphdesc;
pub mod info;
pub mod interval;
pub mod series;
