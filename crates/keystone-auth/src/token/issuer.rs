//! The token issuer: minting, verification, and the rotation hot path.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use keystone_core::config::token::TokenConfig;
use keystone_core::types::RequestMeta;
use keystone_core::{AuthError, AuthResult};
use keystone_entity::account::Account;
use keystone_entity::device::Device;
use keystone_entity::session::TerminationReason;
use keystone_entity::token::{RevokedToken, TokenKind};
use keystone_store::traits::{DeviceStore, RevocationStore, SessionStore};

use crate::hash::sha256_hex;
use crate::jwt::{AccessClaims, DecodedClaims, IssuedToken, RefreshClaims, TokenDecoder, TokenEncoder};

/// The outcome of a refresh-token issuance.
#[derive(Debug, Clone)]
pub struct RefreshIssue {
    /// The refresh token the client should hold from now on.
    pub token: String,
    /// Its expiry.
    pub expires_at: DateTime<Utc>,
    /// Whether a new token was minted. `false` means the presented token
    /// was still outside the rotation window and was returned unchanged.
    pub rotated: bool,
}

/// Claims returned by a successful verification.
#[derive(Debug, Clone)]
pub enum VerifiedClaims {
    /// A verified access token with a live session behind it.
    Access(AccessClaims),
    /// A verified, unrevoked refresh token with an unblocked device.
    Refresh(RefreshClaims),
}

/// Mints and verifies access/refresh tokens and orchestrates rotation.
///
/// Rotation is serialized per device through a compare-and-swap on the
/// stored token hash: the losing concurrent caller gets
/// [`AuthError::RotationConflict`] and never a second valid token.
pub struct TokenIssuer {
    encoder: TokenEncoder,
    decoder: TokenDecoder,
    devices: Arc<dyn DeviceStore>,
    sessions: Arc<dyn SessionStore>,
    revocations: Arc<dyn RevocationStore>,
    /// Final stretch before refresh expiry in which rotation kicks in.
    rotation_window: Duration,
}

impl TokenIssuer {
    /// Creates a token issuer from configuration and its collaborating stores.
    pub fn new(
        config: &TokenConfig,
        devices: Arc<dyn DeviceStore>,
        sessions: Arc<dyn SessionStore>,
        revocations: Arc<dyn RevocationStore>,
    ) -> Self {
        Self {
            encoder: TokenEncoder::new(config),
            decoder: TokenDecoder::new(config),
            devices,
            sessions,
            revocations,
            rotation_window: Duration::days(config.rotation_window_days as i64),
        }
    }

    /// Signs a short-lived access token bound to the given session.
    ///
    /// No side effects beyond signing.
    pub fn issue_access_token(
        &self,
        account: &Account,
        session_id: Uuid,
    ) -> AuthResult<IssuedToken> {
        let issued = self.encoder.sign_access(account, session_id)?;
        debug!(account_id = %account.id, session_id = %session_id, "issued access token");
        Ok(issued)
    }

    /// Issues or rotates a refresh token for the given device.
    ///
    /// - No current token → mint and bind a fresh one.
    /// - Current token fails verification (bad signature, expired, wrong
    ///   type) → treat as a fresh login and mint.
    /// - Current token valid but outside the rotation window → refresh
    ///   device activity in place and return the same token.
    /// - Current token valid and within the rotation window → mint a new
    ///   token, compare-and-swap the device binding, revoke the old token
    ///   at its original expiry, and rebind the session.
    pub async fn issue_refresh_token(
        &self,
        account: &Account,
        device: &Device,
        current: Option<&str>,
        meta: &RequestMeta,
    ) -> AuthResult<RefreshIssue> {
        if device.is_blocked() {
            return Err(AuthError::DeviceBlocked);
        }

        let now = Utc::now();

        let Some(current) = current else {
            return self.mint_and_bind(account.id, device, now, meta).await;
        };

        let claims = match self.decoder.decode_refresh(current) {
            Ok(claims) => claims,
            Err(
                AuthError::TokenExpired | AuthError::TokenMalformed | AuthError::TokenTypeMismatch,
            ) => {
                debug!(device_id = %device.id, "presented refresh token unusable, minting fresh");
                return self.mint_and_bind(account.id, device, now, meta).await;
            }
            Err(err) => return Err(err),
        };

        let current_hash = sha256_hex(current);

        if self.revocations.is_revoked(&current_hash).await? {
            warn!(device_id = %device.id, "revoked refresh token presented for rotation");
            return Err(AuthError::TokenRevoked);
        }

        // A token that verifies but is no longer the device's current
        // binding has been rotated out by a concurrent caller.
        if device.refresh_token_hash.as_deref() != Some(current_hash.as_str()) {
            return Err(AuthError::TokenRevoked);
        }

        let expires_at = claims.expires_at();

        if now < expires_at - self.rotation_window {
            // Outside the rotation window: the same token keeps serving.
            self.devices
                .touch(device.id, now, meta.ip_string().as_deref(), meta.user_agent.as_deref())
                .await?;
            return Ok(RefreshIssue {
                token: current.to_string(),
                expires_at,
                rotated: false,
            });
        }

        // Rotation hot path.
        let new = self.encoder.sign_refresh(account.id, device.id)?;
        let new_hash = sha256_hex(&new.token);

        let swapped = self
            .devices
            .swap_refresh_token(device.id, &current_hash, Some(&new_hash), Some(new.expires_at))
            .await?;
        if !swapped {
            debug!(device_id = %device.id, "lost rotation race");
            return Err(AuthError::RotationConflict);
        }

        // Only the swap winner reaches here, so the old hash is revoked
        // exactly once, at the old token's original expiry.
        self.revocations
            .revoke(&RevokedToken {
                token_hash: current_hash.clone(),
                token_kind: TokenKind::Refresh,
                account_id: account.id,
                expires_at,
                revoked_at: now,
            })
            .await?;

        self.sessions.rebind_refresh_hash(&current_hash, &new_hash).await?;
        self.devices
            .touch(device.id, now, meta.ip_string().as_deref(), meta.user_agent.as_deref())
            .await?;

        info!(account_id = %account.id, device_id = %device.id, "rotated refresh token");

        Ok(RefreshIssue {
            token: new.token,
            expires_at: new.expires_at,
            rotated: true,
        })
    }

    /// Decodes and checks signature, expiry, and type; confirms the
    /// backing session (access) or device and revocation state (refresh).
    pub async fn verify_token(
        &self,
        token: &str,
        expected: TokenKind,
    ) -> AuthResult<VerifiedClaims> {
        match expected {
            TokenKind::Access => {
                let claims = self.decoder.decode_access(token)?;

                let session = self
                    .sessions
                    .find_for_account(claims.sid, claims.sub)
                    .await?
                    .ok_or(AuthError::SessionTerminated)?;
                if !session.is_active() {
                    return Err(AuthError::SessionTerminated);
                }

                if let Some(device_id) = session.device_id {
                    let device = self.devices.find_by_id(device_id).await?;
                    if device.is_some_and(|d| d.is_blocked()) {
                        return Err(AuthError::DeviceBlocked);
                    }
                }

                Ok(VerifiedClaims::Access(claims))
            }
            TokenKind::Refresh => {
                let claims = self.decoder.decode_refresh(token)?;

                let token_hash = sha256_hex(token);
                if self.revocations.is_revoked(&token_hash).await? {
                    return Err(AuthError::TokenRevoked);
                }

                let device = self
                    .devices
                    .find_by_id(claims.did)
                    .await?
                    .ok_or(AuthError::TokenMalformed)?;
                if device.is_blocked() {
                    return Err(AuthError::DeviceBlocked);
                }

                // The device binding, not the revocation row, is the
                // rotation commit point: a hash that has been swapped out
                // is dead even before its revocation row lands.
                if device.refresh_token_hash.as_deref() != Some(token_hash.as_str()) {
                    return Err(AuthError::TokenRevoked);
                }

                Ok(VerifiedClaims::Refresh(claims))
            }
        }
    }

    /// Explicitly invalidates a token (logout).
    ///
    /// Records the hash in the revocation store at the token's real
    /// expiry and terminates the bound session with reason `LoggedOut`.
    /// An already-expired token is a no-op.
    pub async fn revoke_token(&self, token: &str) -> AuthResult<()> {
        let decoded = match self.decoder.decode_any(token) {
            Ok(decoded) => decoded,
            // Expired tokens no longer need revocation tracking.
            Err(AuthError::TokenExpired) => return Ok(()),
            Err(err) => return Err(err),
        };

        let now = Utc::now();
        let token_hash = sha256_hex(token);

        match decoded {
            DecodedClaims::Access(claims) => {
                self.revocations
                    .revoke(&RevokedToken {
                        token_hash,
                        token_kind: TokenKind::Access,
                        account_id: claims.sub,
                        expires_at: claims.expires_at(),
                        revoked_at: now,
                    })
                    .await?;
                self.sessions
                    .terminate(claims.sid, TerminationReason::LoggedOut, now)
                    .await?;
                info!(account_id = %claims.sub, session_id = %claims.sid, "access token revoked");
            }
            DecodedClaims::Refresh(claims) => {
                self.revocations
                    .revoke(&RevokedToken {
                        token_hash: token_hash.clone(),
                        token_kind: TokenKind::Refresh,
                        account_id: claims.sub,
                        expires_at: claims.expires_at(),
                        revoked_at: now,
                    })
                    .await?;

                if let Some(session) = self.sessions.find_by_refresh_hash(&token_hash).await? {
                    self.sessions
                        .terminate(session.id, TerminationReason::LoggedOut, now)
                        .await?;
                }

                // Clear the device binding so the slot is free for the
                // next login; a concurrent rotation winning the race is
                // fine, the binding is then already a different hash.
                self.devices
                    .swap_refresh_token(claims.did, &token_hash, None, None)
                    .await?;

                info!(account_id = %claims.sub, device_id = %claims.did, "refresh token revoked");
            }
        }

        Ok(())
    }

    /// Fresh mint for a device with no usable current token.
    async fn mint_and_bind(
        &self,
        account_id: Uuid,
        device: &Device,
        now: DateTime<Utc>,
        meta: &RequestMeta,
    ) -> AuthResult<RefreshIssue> {
        let issued = self.encoder.sign_refresh(account_id, device.id)?;
        let token_hash = sha256_hex(&issued.token);

        self.devices
            .bind_refresh_token(device.id, &token_hash, issued.expires_at)
            .await?;
        self.devices
            .touch(device.id, now, meta.ip_string().as_deref(), meta.user_agent.as_deref())
            .await?;

        info!(account_id = %account_id, device_id = %device.id, "issued refresh token");

        Ok(RefreshIssue {
            token: issued.token,
            expires_at: issued.expires_at,
            rotated: true,
        })
    }
}
