use chrono::Utc;
use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, SqlErr, prelude::*};

use crate::{EngineError, ProfileUpdate, ResultEngine, User, users};

use super::{Engine, normalize_required_text, validate_id};

impl Engine {
    /// Registers a user. Emails are unique, compared after lowercasing.
    pub async fn create_user(&self, name: &str, email: &str) -> ResultEngine<User> {
        let name = normalize_required_text(name, "name")?;
        let email = normalize_email(email)?;

        let user = self
            .with_tx::<User, _>("create_user", move |engine, db_tx| {
                Box::pin(engine.create_user_in_tx(db_tx, name.clone(), email.clone()))
            })
            .await?;
        tracing::debug!(user_id = user.id, "user created");
        Ok(user)
    }

    pub async fn user(&self, user_id: i64) -> ResultEngine<User> {
        validate_id(user_id, "user")?;
        self.require_user(&self.database, user_id)
            .await
            .map(User::from)
    }

    /// Changes the name and/or email of `user_id`.
    ///
    /// Both fields follow the rules of [`Engine::create_user`]. Keeping the
    /// current email is not a conflict.
    pub async fn update_user(&self, user_id: i64, update: ProfileUpdate) -> ResultEngine<User> {
        validate_id(user_id, "user")?;
        let name = update
            .name
            .as_deref()
            .map(|name| normalize_required_text(name, "name"))
            .transpose()?;
        let email = update.email.as_deref().map(normalize_email).transpose()?;

        let user = self
            .with_tx::<User, _>("update_user", move |engine, db_tx| {
                Box::pin(engine.update_user_in_tx(db_tx, user_id, name.clone(), email.clone()))
            })
            .await?;
        tracing::debug!(user_id, "profile updated");
        Ok(user)
    }

    async fn create_user_in_tx(
        &self,
        db_tx: &DatabaseTransaction,
        name: String,
        email: String,
    ) -> ResultEngine<User> {
        self.ensure_email_free(db_tx, &email, None).await?;

        let model = users::ActiveModel {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(name),
            email: ActiveValue::Set(email),
            created_at: ActiveValue::Set(Utc::now()),
        }
        .insert(db_tx)
        .await
        .map_err(email_conflict)?;
        Ok(model.into())
    }

    async fn update_user_in_tx(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: i64,
        name: Option<String>,
        email: Option<String>,
    ) -> ResultEngine<User> {
        let model = self.require_user(db_tx, user_id).await?;
        if name.is_none() && email.is_none() {
            return Ok(model.into());
        }
        if let Some(email) = email.as_deref() {
            self.ensure_email_free(db_tx, email, Some(user_id)).await?;
        }

        let mut active: users::ActiveModel = model.into();
        if let Some(name) = name {
            active.name = ActiveValue::Set(name);
        }
        if let Some(email) = email {
            active.email = ActiveValue::Set(email);
        }
        let model = active.update(db_tx).await.map_err(email_conflict)?;
        Ok(model.into())
    }

    /// Fails if `email` belongs to a user other than `owner`.
    async fn ensure_email_free(
        &self,
        db_tx: &DatabaseTransaction,
        email: &str,
        owner: Option<i64>,
    ) -> ResultEngine<()> {
        let mut query = users::Entity::find().filter(users::Column::Email.eq(email));
        if let Some(owner) = owner {
            query = query.filter(users::Column::Id.ne(owner));
        }
        if query.one(db_tx).await?.is_some() {
            return Err(email_taken());
        }
        Ok(())
    }
}

fn normalize_email(email: &str) -> ResultEngine<String> {
    let email = normalize_required_text(email, "email")?.to_lowercase();
    if !email.contains('@') {
        return Err(EngineError::InvalidOperation(format!(
            "invalid email: {email}"
        )));
    }
    Ok(email)
}

fn email_conflict(err: DbErr) -> EngineError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => email_taken(),
        _ => err.into(),
    }
}

fn email_taken() -> EngineError {
    EngineError::InvalidOperation("email already registered".to_string())
}
