use serde::{Deserialize, Serialize};

use super::{PasswordHash, RegistrationError, UserId, Username};

/// User集約
///
/// 登録後に変更できるのは認証情報（password_hash）のみ。
/// 貸出から参照されるため削除操作は持たない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    pub username: Username,
    pub password_hash: PasswordHash,
}

/// 純粋関数：利用者を登録する
///
/// ユーザー名の一意性はここでは判定しない（ストレージの一意制約で保証）。
pub fn register_user(username: String, password_hash: String) -> Result<User, RegistrationError> {
    Ok(User {
        user_id: UserId::new(),
        username: Username::try_from(username)?,
        password_hash: PasswordHash::try_from(password_hash)?,
    })
}

/// 純粋関数：認証情報を更新する
pub fn rotate_credential(user: &User, password_hash: String) -> Result<User, RegistrationError> {
    Ok(User {
        password_hash: PasswordHash::try_from(password_hash)?,
        ..user.clone()
    })
}
