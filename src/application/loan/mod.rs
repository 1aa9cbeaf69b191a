mod loan_service;

pub use loan_service::{get_loan, is_available, issue_loan, list_loans_for_user, return_loan};
