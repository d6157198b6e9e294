pub mod ocha;
pub mod prod_db;
