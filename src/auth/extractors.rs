use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, StatusCode},
};
use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};

use crate::auth::repo_types::{Session, User};
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "ebookportal.session_token";

/// Reads the session token from the signed cookie; tampered cookies read as absent.
pub fn session_token(headers: &HeaderMap, key: &Key) -> Option<String> {
    SignedCookieJar::from_headers(headers, key.clone())
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

pub fn session_cookie(token: String, max_age: time::Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(max_age)
        .build()
}

pub fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

/// Resolves the request's session from headers, `None` when not signed in.
pub async fn resolve_session(state: &AppState, headers: &HeaderMap) -> Option<(Session, User)> {
    let token = session_token(headers, &state.cookie_key)?;
    state.sessions.validate_session(&token).await
}

/// Session if present; never rejects.
pub struct MaybeSession(pub Option<(Session, User)>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeSession {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeSession(resolve_session(state, &parts.headers).await))
    }
}

/// Requires a live session.
pub struct AuthSession {
    pub session: Session,
    pub user: User,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthSession {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let (session, user) = resolve_session(state, &parts.headers)
            .await
            .ok_or((StatusCode::UNAUTHORIZED, "Authentication required".to_string()))?;
        Ok(AuthSession { session, user })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::{COOKIE, SET_COOKIE};
    use axum::response::IntoResponse;

    fn key() -> Key {
        Key::derive_from(b"an-application-secret-of-32-bytes-or-more")
    }

    fn request_headers_from(jar: SignedCookieJar) -> HeaderMap {
        let response = (jar, ()).into_response();
        let set_cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        let pair = set_cookie.split(';').next().unwrap().to_string();
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, pair.parse().unwrap());
        headers
    }

    #[test]
    fn signed_cookie_round_trips_token() {
        let jar = SignedCookieJar::new(key())
            .add(session_cookie("tok123".into(), time::Duration::hours(1), false));
        let headers = request_headers_from(jar);
        assert_eq!(session_token(&headers, &key()).as_deref(), Some("tok123"));
    }

    #[test]
    fn unsigned_or_foreign_cookie_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, format!("{SESSION_COOKIE}=tok123").parse().unwrap());
        assert!(session_token(&headers, &key()).is_none());

        let other = Key::derive_from(b"some-other-secret-that-is-also-32-bytes+");
        let jar = SignedCookieJar::new(other)
            .add(session_cookie("tok123".into(), time::Duration::hours(1), false));
        assert!(session_token(&request_headers_from(jar), &key()).is_none());
    }

    #[test]
    fn session_cookie_attributes() {
        let c = session_cookie("t".into(), time::Duration::hours(2), true);
        assert_eq!(c.path(), Some("/"));
        assert_eq!(c.http_only(), Some(true));
        assert_eq!(c.secure(), Some(true));
        assert_eq!(c.same_site(), Some(SameSite::Lax));
        assert_eq!(c.max_age(), Some(time::Duration::hours(2)));
    }
}
