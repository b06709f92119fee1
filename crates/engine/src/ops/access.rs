use sea_orm::{ConnectionTrait, prelude::*};

use crate::{EngineError, ResultEngine, accounts, users};

use super::Engine;

impl Engine {
    pub(super) async fn find_account<C: ConnectionTrait>(
        &self,
        db: &C,
        account_id: i64,
    ) -> ResultEngine<Option<accounts::Model>> {
        accounts::Entity::find_by_id(account_id)
            .one(db)
            .await
            .map_err(Into::into)
    }

    pub(super) async fn require_account<C: ConnectionTrait>(
        &self,
        db: &C,
        account_id: i64,
        label: &str,
    ) -> ResultEngine<accounts::Model> {
        self.find_account(db, account_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(label.to_string()))
    }

    /// Loads the account and checks it belongs to `user_id`.
    ///
    /// A missing account is reported before a foreign one.
    pub(super) async fn require_owned_account<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: i64,
        account_id: i64,
    ) -> ResultEngine<accounts::Model> {
        let model = self.require_account(db, account_id, "account").await?;
        require_owner(&model, user_id)?;
        Ok(model)
    }

    pub(super) async fn require_user<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: i64,
    ) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound("user".to_string()))
    }
}

pub(super) fn require_owner(model: &accounts::Model, user_id: i64) -> ResultEngine<()> {
    if model.user_id != user_id {
        return Err(EngineError::Forbidden(
            "you can only access your own accounts".to_string(),
        ));
    }
    Ok(())
}
