//! The records table and the pages and endpoints for managing single records.

mod export;
mod form;
mod page;
mod receipt;

pub use export::get_records_csv;
pub use form::{
    create_record_endpoint, get_edit_record_page, get_new_record_page, update_record_endpoint,
};
pub use page::{delete_record_endpoint, get_records_page};
pub use receipt::get_receipt_page;
