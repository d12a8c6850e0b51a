use actix_web::{
    Error as ActixError, FromRequest, HttpRequest, dev::Payload, error::ErrorUnauthorized,
    web::Data,
};
use anyhow::{Result, anyhow};
use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::future::{Ready, ready};
use uuid::Uuid;

use crate::config::Config;
use crate::database::models::{AuthResponse, CreateUserInput, LoginInput, User, UserRole};
use crate::database::repositories::UserRepository;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid, // user id
    pub email: String,
    pub tech_id: Option<Uuid>, // linked technician, for ownership checks
    pub role: UserRole,
    pub exp: usize, // expiration time
}

impl Claims {
    pub fn user_id(&self) -> Uuid {
        self.sub
    }
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
    pub fn is_manager(&self) -> bool {
        self.role == UserRole::Manager
    }
    pub fn is_manager_or_admin(&self) -> bool {
        self.is_manager() || self.is_admin()
    }
}

impl FromRequest for Claims {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let auth_header = req.headers().get("Authorization");

        if let Some(auth_header) = auth_header {
            if let Ok(auth_str) = auth_header.to_str() {
                if auth_str.starts_with("Bearer ") {
                    let token = &auth_str[7..]; // Remove "Bearer " prefix

                    // Get the config from app data
                    if let Some(config) = req.app_data::<Data<Config>>() {
                        match decode::<Claims>(
                            token,
                            &DecodingKey::from_secret(config.jwt_secret.as_ref()),
                            &Validation::new(Algorithm::HS256),
                        ) {
                            Ok(token_data) => {
                                return ready(Ok(token_data.claims));
                            }
                            Err(_) => {
                                return ready(Err(ErrorUnauthorized("Invalid token")));
                            }
                        }
                    }
                }
            }
        }

        ready(Err(ErrorUnauthorized(
            "Missing or invalid authorization header",
        )))
    }
}

#[derive(Clone)]
pub struct AuthService {
    user_repository: UserRepository,
    config: Config,
}

impl AuthService {
    pub fn new(user_repository: UserRepository, config: Config) -> Self {
        Self {
            user_repository,
            config,
        }
    }

    pub async fn register(&self, request: CreateUserInput) -> Result<AuthResponse> {
        // Check if email already exists
        if self.user_repository.email_exists(&request.email).await? {
            return Err(anyhow!("Email already exists"));
        }

        // Hash password
        let password_hash = hash(&request.password, DEFAULT_COST)?;

        // Create user
        let user = User::new(request.email, password_hash, request.full_name, request.role);

        let user = self.user_repository.create_user(&user).await?;

        let token = self.generate_token(&user)?;

        Ok(AuthResponse {
            token,
            user: user.into(),
        })
    }

    pub async fn login(&self, request: LoginInput) -> Result<AuthResponse> {
        // Find user by email
        let user = self
            .user_repository
            .find_by_email(&request.email)
            .await?
            .ok_or_else(|| anyhow!("Invalid email or password"))?;

        // Verify password
        if !verify(&request.password, &user.password_hash)? {
            return Err(anyhow!("Invalid email or password"));
        }

        self.user_repository.touch_last_login(user.id).await?;

        let token = self.generate_token(&user)?;

        Ok(AuthResponse {
            token,
            user: user.into(),
        })
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<()> {
        let user = self
            .user_repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| anyhow!("User not found"))?;

        if !verify(current_password, &user.password_hash)? {
            return Err(anyhow!("Current password is incorrect"));
        }

        let password_hash = hash(new_password, DEFAULT_COST)?;
        self.user_repository
            .update_password(user_id, &password_hash)
            .await?;

        Ok(())
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_ref()),
            &Validation::new(Algorithm::HS256),
        )?;

        Ok(token_data.claims)
    }

    pub async fn get_user_from_token(&self, token: &str) -> Result<User> {
        let claims = self.verify_token(token)?;
        let user = self
            .user_repository
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| anyhow!("User not found"))?;

        Ok(user)
    }

    pub fn generate_token(&self, user: &User) -> Result<String> {
        let expiration = Utc::now()
            .checked_add_signed(Duration::days(self.config.jwt_expiration_days))
            .ok_or_else(|| anyhow!("invalid expiration timestamp"))?
            .timestamp() as usize;

        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            tech_id: user.tech_id,
            role: user.role,
            exp: expiration,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_ref()),
        )?;

        Ok(token)
    }
}
