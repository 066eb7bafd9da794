pub mod barcode;
pub mod grocery_run;
pub mod inventory_batch;
pub mod product;
pub mod user;
