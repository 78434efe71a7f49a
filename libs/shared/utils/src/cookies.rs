use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use shared_models::auth::Role;

use crate::jwt::TOKEN_TTL_HOURS;

/// Http-only session cookie for `role`, scoped to the whole site.
pub fn session_cookie(role: Role, token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((role.cookie_name(), token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::hours(TOKEN_TTL_HOURS))
        .build()
}

pub fn clear_session(jar: CookieJar, role: Role) -> CookieJar {
    jar.remove(Cookie::build(role.cookie_name()).path("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie(Role::Doctor, "abc".to_string(), true);

        assert_eq!(cookie.name(), "doctorToken");
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(time::Duration::hours(24)));
    }
}
