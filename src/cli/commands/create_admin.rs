use anyhow::{bail, Result};
use model::entities::user;
use sea_orm::{ActiveModelTrait, Database, EntityTrait, Set, TransactionTrait};
use tracing::{debug, error, info, trace};
use validator::Validate;

use crate::errors::ApiError;
use crate::handlers::users::CreateUserRequest;
use crate::uniqueness::{check_unique_on_create, UniqueField};
use crate::validation::field_errors;

/// Insert an administrator. The same field rules as signup apply.
pub async fn create_admin(
    database_url: &str,
    username: &str,
    email: &str,
    password: &str,
) -> Result<()> {
    trace!("Entering create_admin function");

    let request = CreateUserRequest {
        username: Some(username.to_string()),
        email: Some(email.to_string()),
        password: Some(password.to_string()),
    };
    if let Err(errors) = request.validate() {
        let details = field_errors(&errors);
        error!("Invalid administrator details: {:?}", details);
        bail!("invalid administrator details: {details:?}");
    }

    let db = Database::connect(database_url).await?;
    debug!("Connected to database: {}", database_url);
    let txn = db.begin().await?;

    let fields = [
        UniqueField::new("username", user::Column::Username, Some(username)),
        UniqueField::new("email", user::Column::Email, Some(email)),
    ];
    match check_unique_on_create(&txn, user::Entity::find(), &fields).await {
        Ok(()) => {}
        Err(ApiError::Conflict(details)) => {
            let taken: Vec<_> = details.keys().cloned().collect();
            bail!("a user with this {} already exists", taken.join(" and "));
        }
        Err(e) => return Err(e.into()),
    }

    let mut admin = user::ActiveModel {
        username: Set(username.to_string()),
        email: Set(email.to_string()),
        is_admin: Set(true),
        ..Default::default()
    };
    admin.set_password(password)?;
    let admin = admin.insert(&txn).await?;
    txn.commit().await?;

    info!("Created administrator '{}' with ID {}", admin.username, admin.id);
    Ok(())
}
