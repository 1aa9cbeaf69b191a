mod catalog_service;

pub use catalog_service::{
    add_book, find_user_by_username, get_book, get_user, list_books, register_user,
    rotate_credential,
};
