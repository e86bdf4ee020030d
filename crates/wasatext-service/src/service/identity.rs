use wasatext_shared::identity::generate_security_key;
use wasatext_shared::validation::{validate_image, validate_username};
use wasatext_shared::UserId;
use wasatext_store::{User, Users};

use super::{authenticate, missing, ConversationService};
use crate::error::ServiceError;
use crate::views::LoginOutcome;

impl ConversationService {
    /// Log in by username, creating the account on first use.
    ///
    /// The existence check and the insert share one write transaction, so
    /// two concurrent first logins for the same name cannot both create it.
    pub fn login(&self, username: &str) -> Result<LoginOutcome, ServiceError> {
        validate_username(username)?;
        self.write("login", |conn| {
            let users = Users::new(conn);
            if users.exists(username)? {
                let user_id = users.resolve_by_name(username)?;
                let security_key = users.security_key(user_id)?;
                tracing::debug!(user_id = %user_id, "existing user logged in");
                return Ok(LoginOutcome {
                    user_id,
                    username: username.to_string(),
                    security_key,
                    created: false,
                });
            }

            let security_key = generate_security_key();
            let user_id = users.create(username, &security_key)?;
            Ok(LoginOutcome {
                user_id,
                username: username.to_string(),
                security_key,
                created: true,
            })
        })
    }

    /// The profile behind a security key.
    pub fn whoami(&self, key: &str) -> Result<User, ServiceError> {
        self.read("whoami", |conn| {
            let me = authenticate(conn, key)?;
            Ok(Users::new(conn).get(me)?)
        })
    }

    pub fn username_of(&self, key: &str, user: UserId) -> Result<String, ServiceError> {
        self.read("username_of", |conn| {
            authenticate(conn, key)?;
            Users::new(conn).username(user).map_err(missing("user"))
        })
    }

    pub fn set_username(&self, key: &str, new_name: &str) -> Result<(), ServiceError> {
        validate_username(new_name)?;
        self.write("set_username", |conn| {
            let me = authenticate(conn, key)?;
            Users::new(conn).rename(me, new_name)?;
            tracing::info!(user_id = %me, username = new_name, "username changed");
            Ok(())
        })
    }

    pub fn set_user_photo(&self, key: &str, image: &[u8]) -> Result<(), ServiceError> {
        validate_image(image)?;
        self.write("set_user_photo", |conn| {
            let me = authenticate(conn, key)?;
            Users::new(conn).set_avatar(me, image)?;
            Ok(())
        })
    }

    pub fn user_photo(&self, key: &str, user: UserId) -> Result<Option<Vec<u8>>, ServiceError> {
        self.read("user_photo", |conn| {
            authenticate(conn, key)?;
            Users::new(conn).avatar(user).map_err(missing("user"))
        })
    }
}

#[cfg(test)]
mod tests {
    use wasatext_shared::ValidationError;

    use super::super::testing::*;
    use super::*;

    #[test]
    fn first_login_creates_then_returns_same_identity() {
        let (service, _dir) = service();

        let first = service.login("alice").unwrap();
        assert!(first.created);
        assert_eq!(first.security_key.len(), 16);

        let again = service.login("alice").unwrap();
        assert!(!again.created);
        assert_eq!(again.user_id, first.user_id);
        assert_eq!(again.security_key, first.security_key);

        let bob = service.login("bob").unwrap();
        assert_ne!(bob.user_id, first.user_id);
        assert_ne!(bob.security_key, first.security_key);
    }

    #[test]
    fn login_rejects_invalid_username() {
        let (service, _dir) = service();
        assert!(matches!(
            service.login("al"),
            Err(ServiceError::Validation(ValidationError::Username { .. }))
        ));
        assert!(matches!(
            service.login("alice smith"),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn unknown_key_is_invalid_credential() {
        let (service, _dir) = service();
        user(&service, "alice");
        assert!(matches!(service.whoami("nope"), Err(ServiceError::InvalidCredential)));
        assert!(matches!(service.whoami(""), Err(ServiceError::InvalidCredential)));
    }

    #[test]
    fn rename_and_lookup() {
        let (service, _dir) = service();
        let alice = user(&service, "alice");
        let bob = user(&service, "bob");

        service.set_username(&alice.security_key, "alicia").unwrap();
        assert_eq!(
            service.username_of(&bob.security_key, alice.user_id).unwrap(),
            "alicia"
        );
        // own current name is accepted
        service.set_username(&alice.security_key, "alicia").unwrap();

        assert!(matches!(
            service.set_username(&alice.security_key, "bob"),
            Err(ServiceError::DuplicateUsername)
        ));
        assert!(matches!(
            service.username_of(&bob.security_key, UserId(999)),
            Err(ServiceError::NotFound("user"))
        ));
    }

    #[test]
    fn photos() {
        let (service, _dir) = service();
        let alice = user(&service, "alice");
        let bob = user(&service, "bob");

        assert_eq!(service.user_photo(&bob.security_key, alice.user_id).unwrap(), None);
        service.set_user_photo(&alice.security_key, b"\x89PNG").unwrap();
        assert_eq!(
            service.user_photo(&bob.security_key, alice.user_id).unwrap(),
            Some(b"\x89PNG".to_vec())
        );
        assert!(service.whoami(&alice.security_key).unwrap().has_avatar);
        assert!(matches!(
            service.set_user_photo(&alice.security_key, b""),
            Err(ServiceError::Validation(ValidationError::EmptyImage))
        ));
    }
}
