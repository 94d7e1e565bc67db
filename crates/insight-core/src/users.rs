//! User lookup by ID, username or email
//!
//! Lookup problems are reported inside [`UserLookup`] instead of as errors, so a
//! batch of keys can be resolved with partial failures.

use serde::Serialize;
use serde_with::skip_serializing_none;

use crate::prelude::*;
use insight_types::codes;
use insight_types::user_adapter::User;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserKey<'a> {
	Id(UserId),
	/// Username or email
	Name(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum KeyType {
	#[serde(rename = "ID")]
	Id,
	#[serde(rename = "username")]
	Username,
	#[serde(rename = "email")]
	Email,
	#[serde(rename = "username/email")]
	UsernameOrEmail,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
pub struct UserLookup {
	pub user: Option<User>,
	pub key_type: KeyType,
	pub error_code: Option<u32>,
	pub error_message: Option<String>,
}

impl UserLookup {
	fn failed(key_type: KeyType, code: u32, message: String) -> Self {
		UserLookup { user: None, key_type, error_code: Some(code), error_message: Some(message) }
	}
}

/// Data-layer failures are still returned as `Err`.
pub async fn get_user_by_key(
	app: &App,
	key: UserKey<'_>,
	fail_if_inactive: bool,
) -> ClResult<UserLookup> {
	let (user, key_type, key_str) = match key {
		UserKey::Id(user_id) => match app.user_adapter.read_user(user_id).await {
			Ok(user) => (user, KeyType::Id, user_id.to_string()),
			Err(Error::NotFound) => {
				return Ok(UserLookup::failed(
					KeyType::Id,
					codes::USER_NOT_FOUND,
					format!("User with ID ({}) does not exist!", user_id),
				));
			}
			Err(err) => return Err(err),
		},
		UserKey::Name(name) => {
			let name = name.trim();
			if name.is_empty() {
				return Ok(UserLookup::failed(
					KeyType::UsernameOrEmail,
					codes::USER_NOT_FOUND,
					"User key cannot be an empty string!".into(),
				));
			}
			let mut users = app.user_adapter.find_users_by_key(name).await?;
			if users.len() > 1 {
				return Ok(UserLookup::failed(
					KeyType::UsernameOrEmail,
					codes::USER_KEY_CONFLICT,
					format!("Multiple users found for key ({}).", name),
				));
			}
			let Some(user) = users.pop() else {
				return Ok(UserLookup::failed(
					KeyType::UsernameOrEmail,
					codes::USER_NOT_FOUND,
					format!("User with username/email ({}) does not exist!", name),
				));
			};
			let key_type = if &*user.username == name { KeyType::Username } else { KeyType::Email };
			(user, key_type, name.to_string())
		}
	};

	if fail_if_inactive && !user.is_active {
		return Ok(UserLookup::failed(
			key_type,
			codes::USER_IS_NOT_ACTIVE,
			format!("User with ({:?}={}) is not active!", key_type, key_str),
		));
	}
	Ok(UserLookup { user: Some(user), key_type, error_code: None, error_message: None })
}

/// One lookup per key, in order
pub async fn get_users_by_keys(
	app: &App,
	keys: &[UserKey<'_>],
	fail_if_inactive: bool,
) -> ClResult<Vec<UserLookup>> {
	let mut res = Vec::with_capacity(keys.len());
	for key in keys {
		res.push(get_user_by_key(app, key.clone(), fail_if_inactive).await?);
	}
	Ok(res)
}


// vim: ts=4
