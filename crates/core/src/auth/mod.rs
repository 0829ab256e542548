mod none;
mod token;
mod traits;
mod types;

pub use none::*;
pub use token::*;
pub use traits::*;
pub use types::*;

use crate::config::AuthConfig;

/// Factory function to create authenticator from config
pub fn create_authenticator(config: &AuthConfig) -> Result<Box<dyn Authenticator>, AuthError> {
    use crate::config::AuthMethod;

    match config.method {
        AuthMethod::None => Ok(Box::new(NoneAuthenticator::new())),
        AuthMethod::Token => {
            if config.tokens.is_empty() {
                return Err(AuthError::ConfigurationError(
                    "at least one token must be set when using Token auth method".to_string(),
                ));
            }
            Ok(Box::new(TokenAuthenticator::new(config.tokens.clone())))
        }
    }
}
