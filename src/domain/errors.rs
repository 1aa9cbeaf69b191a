use super::ValueError;

/// 返却のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnLoanError {
    /// 既に返却済み
    AlreadyReturned,
    /// 返却日が貸出日より前
    ReturnBeforeLoanDate,
}

/// 利用者登録・カタログ登録のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// 入力値が不正
    InvalidValue(ValueError),
}

impl From<ValueError> for RegistrationError {
    fn from(err: ValueError) -> Self {
        RegistrationError::InvalidValue(err)
    }
}
