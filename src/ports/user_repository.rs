use crate::domain::{user::User, value_objects::*};
use async_trait::async_trait;

use super::Result;

/// 利用者登録の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertUserOutcome {
    Inserted,
    /// ユーザー名が既に使われている（一意制約）
    UsernameTaken,
}

/// 利用者リポジトリポート
///
/// usersテーブルへのアクセスを抽象化する。
/// 削除操作は持たない（貸出から参照されるため）。
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 利用者を登録する
    ///
    /// ユーザー名の一意性はストレージの一意制約で判定するため、
    /// 同時に同じユーザー名で登録しても成功するのは1件のみ。
    async fn insert(&self, user: &User) -> Result<InsertUserOutcome>;

    /// 認証情報を更新する
    ///
    /// 対象が存在しない場合は `false` を返す。
    async fn update_password_hash(&self, user_id: UserId, password_hash: &PasswordHash)
    -> Result<bool>;

    /// IDで利用者を取得する
    async fn get_by_id(&self, user_id: UserId) -> Result<Option<User>>;

    /// ユーザー名で利用者を取得する
    async fn find_by_username(&self, username: &Username) -> Result<Option<User>>;
}
