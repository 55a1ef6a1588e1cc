//! Token issuance, verification, rotation, and revocation.

mod common;

use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use common::{Stores, account, device_for, meta, rotating_token_config, session_for, token_config};
use keystone_auth::TokenIssuer;
use keystone_auth::hash::sha256_hex;
use keystone_auth::jwt::{AccessClaims, AccountSnapshot};
use keystone_auth::token::VerifiedClaims;
use keystone_core::AuthError;
use keystone_core::config::token::TokenConfig;
use keystone_entity::token::TokenKind;
use keystone_store::traits::{DeviceStore, RevocationStore, SessionStore};

fn issuer(stores: &Stores, config: &TokenConfig) -> TokenIssuer {
    TokenIssuer::new(
        config,
        stores.devices.clone() as Arc<dyn DeviceStore>,
        stores.sessions.clone() as Arc<dyn SessionStore>,
        stores.revocations.clone() as Arc<dyn RevocationStore>,
    )
}

#[tokio::test]
async fn test_access_token_round_trip() {
    let stores = Stores::new();
    let config = token_config();
    let issuer = issuer(&stores, &config);

    let account = account();
    let session = session_for(account.id, None);
    stores.sessions.create(&session).await.unwrap();

    let issued = issuer.issue_access_token(&account, session.id).unwrap();
    let verified = issuer
        .verify_token(&issued.token, TokenKind::Access)
        .await
        .unwrap();

    let VerifiedClaims::Access(claims) = verified else {
        panic!("expected access claims");
    };
    assert_eq!(claims.sub, account.id);
    assert_eq!(claims.sid, session.id);
    assert_eq!(claims.account.username, account.username);
}

#[tokio::test]
async fn test_access_token_fails_after_session_termination() {
    let stores = Stores::new();
    let config = token_config();
    let issuer = issuer(&stores, &config);

    let account = account();
    let session = session_for(account.id, None);
    stores.sessions.create(&session).await.unwrap();

    let issued = issuer.issue_access_token(&account, session.id).unwrap();
    stores
        .sessions
        .terminate(
            session.id,
            keystone_entity::session::TerminationReason::LoggedOut,
            Utc::now(),
        )
        .await
        .unwrap();

    let err = issuer
        .verify_token(&issued.token, TokenKind::Access)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::SessionTerminated));
}

#[tokio::test]
async fn test_type_mismatch_rejected() {
    let stores = Stores::new();
    let config = token_config();
    let issuer = issuer(&stores, &config);

    let account = account();
    let session = session_for(account.id, None);
    stores.sessions.create(&session).await.unwrap();

    let issued = issuer.issue_access_token(&account, session.id).unwrap();
    let err = issuer
        .verify_token(&issued.token, TokenKind::Refresh)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::TokenTypeMismatch));
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let stores = Stores::new();
    let config = token_config();
    let issuer = issuer(&stores, &config);
    let account = account();

    let now = Utc::now().timestamp();
    let claims = AccessClaims {
        sub: account.id,
        iss: config.issuer.clone(),
        iat: now - 3600,
        exp: now - 120,
        token_type: TokenKind::Access,
        sid: Uuid::new_v4(),
        jti: Uuid::new_v4(),
        account: AccountSnapshot::from(&account),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .unwrap();

    let err = issuer
        .verify_token(&token, TokenKind::Access)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::TokenExpired));
}

#[tokio::test]
async fn test_garbage_token_is_malformed() {
    let stores = Stores::new();
    let config = token_config();
    let issuer = issuer(&stores, &config);

    let err = issuer
        .verify_token("not.a.token", TokenKind::Access)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::TokenMalformed));
}

#[tokio::test]
async fn test_fresh_refresh_issue_binds_device() {
    let stores = Stores::new();
    let config = token_config();
    let issuer = issuer(&stores, &config);

    let account = account();
    let device = device_for(account.id);
    stores.devices.create(&device).await.unwrap();

    let issue = issuer
        .issue_refresh_token(&account, &device, None, &meta())
        .await
        .unwrap();
    assert!(issue.rotated);

    let bound = stores.devices.find_by_id(device.id).await.unwrap().unwrap();
    assert_eq!(
        bound.refresh_token_hash.as_deref(),
        Some(sha256_hex(&issue.token).as_str())
    );
    assert_eq!(bound.refresh_expires_at, Some(issue.expires_at));
}

#[tokio::test]
async fn test_refresh_outside_rotation_window_returns_same_token() {
    let stores = Stores::new();
    let config = token_config();
    let issuer = issuer(&stores, &config);

    let account = account();
    let device = device_for(account.id);
    stores.devices.create(&device).await.unwrap();

    let first = issuer
        .issue_refresh_token(&account, &device, None, &meta())
        .await
        .unwrap();

    let device = stores.devices.find_by_id(device.id).await.unwrap().unwrap();
    let second = issuer
        .issue_refresh_token(&account, &device, Some(&first.token), &meta())
        .await
        .unwrap();

    assert!(!second.rotated);
    assert_eq!(second.token, first.token);
    assert!(
        !stores
            .revocations
            .is_revoked(&sha256_hex(&first.token))
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_refresh_within_rotation_window_rotates_and_revokes() {
    let stores = Stores::new();
    let config = rotating_token_config();
    let issuer = issuer(&stores, &config);

    let account = account();
    let device = device_for(account.id);
    stores.devices.create(&device).await.unwrap();

    let first = issuer
        .issue_refresh_token(&account, &device, None, &meta())
        .await
        .unwrap();

    let device = stores.devices.find_by_id(device.id).await.unwrap().unwrap();
    let second = issuer
        .issue_refresh_token(&account, &device, Some(&first.token), &meta())
        .await
        .unwrap();

    assert!(second.rotated);
    assert_ne!(second.token, first.token);

    // Old token is revoked, new one verifies.
    let err = issuer
        .verify_token(&first.token, TokenKind::Refresh)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::TokenRevoked));
    assert!(
        issuer
            .verify_token(&second.token, TokenKind::Refresh)
            .await
            .is_ok()
    );

    let bound = stores.devices.find_by_id(device.id).await.unwrap().unwrap();
    assert_eq!(
        bound.refresh_token_hash.as_deref(),
        Some(sha256_hex(&second.token).as_str())
    );
}

#[tokio::test]
async fn test_concurrent_rotation_single_winner() {
    let stores = Stores::new();
    let config = rotating_token_config();
    let issuer = issuer(&stores, &config);

    let account = account();
    let device = device_for(account.id);
    stores.devices.create(&device).await.unwrap();

    let first = issuer
        .issue_refresh_token(&account, &device, None, &meta())
        .await
        .unwrap();
    let device = stores.devices.find_by_id(device.id).await.unwrap().unwrap();

    let meta_a = meta();
    let meta_b = meta();
    let (a, b) = tokio::join!(
        issuer.issue_refresh_token(&account, &device, Some(&first.token), &meta_a),
        issuer.issue_refresh_token(&account, &device, Some(&first.token), &meta_b),
    );

    let (winner, loser) = match (a, b) {
        (Ok(w), Err(l)) => (w, l),
        (Err(l), Ok(w)) => (w, l),
        (Ok(_), Ok(_)) => panic!("both concurrent rotations produced a token"),
        (Err(a), Err(b)) => panic!("no rotation succeeded: {a}, {b}"),
    };
    assert!(winner.rotated);
    assert!(matches!(
        loser,
        AuthError::RotationConflict | AuthError::TokenRevoked
    ));

    // Exactly one valid token exists afterwards.
    let bound = stores.devices.find_by_id(device.id).await.unwrap().unwrap();
    assert_eq!(
        bound.refresh_token_hash.as_deref(),
        Some(sha256_hex(&winner.token).as_str())
    );
}

#[tokio::test]
async fn test_rotated_out_token_cannot_rotate_again() {
    let stores = Stores::new();
    let config = rotating_token_config();
    let issuer = issuer(&stores, &config);

    let account = account();
    let device = device_for(account.id);
    stores.devices.create(&device).await.unwrap();

    let first = issuer
        .issue_refresh_token(&account, &device, None, &meta())
        .await
        .unwrap();
    let device_snapshot = stores.devices.find_by_id(device.id).await.unwrap().unwrap();
    issuer
        .issue_refresh_token(&account, &device_snapshot, Some(&first.token), &meta())
        .await
        .unwrap();

    // Re-presenting the rotated-out token with a fresh device read.
    let device_snapshot = stores.devices.find_by_id(device.id).await.unwrap().unwrap();
    let err = issuer
        .issue_refresh_token(&account, &device_snapshot, Some(&first.token), &meta())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::TokenRevoked));
}

#[tokio::test]
async fn test_swapped_out_token_fails_verification_before_revocation_lands() {
    let stores = Stores::new();
    let config = token_config();
    let issuer = issuer(&stores, &config);

    let account = account();
    let device = device_for(account.id);
    stores.devices.create(&device).await.unwrap();

    let issue = issuer
        .issue_refresh_token(&account, &device, None, &meta())
        .await
        .unwrap();

    // A rotation winner whose swap committed but whose revocation write
    // has not happened yet: the binding already points at the new hash.
    let old_hash = sha256_hex(&issue.token);
    let swapped = stores
        .devices
        .swap_refresh_token(
            device.id,
            &old_hash,
            Some(&sha256_hex("replacement-token")),
            Some(issue.expires_at),
        )
        .await
        .unwrap();
    assert!(swapped);
    assert!(!stores.revocations.is_revoked(&old_hash).await.unwrap());

    let err = issuer
        .verify_token(&issue.token, TokenKind::Refresh)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::TokenRevoked));
}

#[tokio::test]
async fn test_blocked_device_rejects_issuance_and_verification() {
    let stores = Stores::new();
    let config = token_config();
    let issuer = issuer(&stores, &config);

    let account = account();
    let device = device_for(account.id);
    stores.devices.create(&device).await.unwrap();

    let issue = issuer
        .issue_refresh_token(&account, &device, None, &meta())
        .await
        .unwrap();

    stores
        .devices
        .block(device.id, "stolen", Utc::now())
        .await
        .unwrap();

    let err = issuer
        .verify_token(&issue.token, TokenKind::Refresh)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::DeviceBlocked));

    let blocked = stores.devices.find_by_id(device.id).await.unwrap().unwrap();
    let err = issuer
        .issue_refresh_token(&account, &blocked, Some(&issue.token), &meta())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::DeviceBlocked));
}

#[tokio::test]
async fn test_revoke_access_token_terminates_session() {
    let stores = Stores::new();
    let config = token_config();
    let issuer = issuer(&stores, &config);

    let account = account();
    let session = session_for(account.id, None);
    stores.sessions.create(&session).await.unwrap();

    let issued = issuer.issue_access_token(&account, session.id).unwrap();
    issuer.revoke_token(&issued.token).await.unwrap();

    let stored = stores
        .sessions
        .find_by_id(session.id)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.terminated_at.is_some());

    let err = issuer
        .verify_token(&issued.token, TokenKind::Access)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::SessionTerminated));
}

#[tokio::test]
async fn test_revoke_refresh_token_clears_binding_and_session() {
    let stores = Stores::new();
    let config = token_config();
    let issuer = issuer(&stores, &config);

    let account = account();
    let device = device_for(account.id);
    stores.devices.create(&device).await.unwrap();

    let issue = issuer
        .issue_refresh_token(&account, &device, None, &meta())
        .await
        .unwrap();

    let mut session = session_for(account.id, Some(device.id));
    session.refresh_token_hash = Some(sha256_hex(&issue.token));
    stores.sessions.create(&session).await.unwrap();

    issuer.revoke_token(&issue.token).await.unwrap();

    let err = issuer
        .verify_token(&issue.token, TokenKind::Refresh)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::TokenRevoked));

    let stored = stores
        .sessions
        .find_by_id(session.id)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.terminated_at.is_some());

    let device = stores.devices.find_by_id(device.id).await.unwrap().unwrap();
    assert!(device.refresh_token_hash.is_none());
}
