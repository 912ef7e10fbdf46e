use std::time::{SystemTime, UNIX_EPOCH};
use serde_json::json;

// Shared test context
struct TestContext {
    client: reqwest::Client,
    base_url: String,
}

impl TestContext {
    fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: "http://127.0.0.1:8001".to_string(),
        }
    }

    fn get_timestamp() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    // Requires a running server (default config) and its database.
    // Run with: cargo test -- --ignored
    #[tokio::test]
    #[ignore]
    async fn test_full_session_lifecycle() {
        let context = TestContext::new();
        let timestamp = TestContext::get_timestamp();
        let email = format!("lifecycle_{}@example.com", timestamp);
        let password = "Abcdef1!";

        // Step 1: Registration
        let reg_response = context
            .client
            .post(format!("{}/auth/register", context.base_url))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap();

        assert_eq!(reg_response.status().as_u16(), 201, "Registration failed");
        let reg_body: Value = reg_response.json().await.unwrap();
        assert_eq!(reg_body["email"], email.as_str());
        assert!(reg_body["user_id"].is_string());

        // Step 2: Duplicate registration is rejected
        let dup_response = context
            .client
            .post(format!("{}/auth/register", context.base_url))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(dup_response.status().as_u16(), 400);

        // Step 3: Login
        let login_response = context
            .client
            .post(format!("{}/auth/login", context.base_url))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap();

        assert_eq!(login_response.status().as_u16(), 200, "Login failed");
        let login_body: Value = login_response.json().await.unwrap();
        let access_token = login_body["access_token"].as_str().unwrap().to_string();
        let original_refresh = login_body["refresh_token"].as_str().unwrap().to_string();
        assert!(!access_token.is_empty());
        assert!(!original_refresh.is_empty());
        assert_eq!(login_body["token_type"], "bearer");
        assert_eq!(login_body["expires_in"], 1800);

        // Step 4: Profile with the access token
        let profile_response = context
            .client
            .get(format!("{}/auth/profile", context.base_url))
            .bearer_auth(&access_token)
            .send()
            .await
            .unwrap();

        assert_eq!(profile_response.status().as_u16(), 200);
        let profile_body: Value = profile_response.json().await.unwrap();
        assert_eq!(profile_body["email"], email.as_str());

        // Step 5: Refresh rotates the pair
        let refresh_response = context
            .client
            .post(format!("{}/auth/refresh", context.base_url))
            .bearer_auth(&original_refresh)
            .send()
            .await
            .unwrap();

        assert_eq!(refresh_response.status().as_u16(), 200);
        let refresh_body: Value = refresh_response.json().await.unwrap();
        let rotated_refresh = refresh_body["refresh_token"].as_str().unwrap().to_string();
        assert_ne!(refresh_body["access_token"], login_body["access_token"]);
        assert_ne!(rotated_refresh, original_refresh);

        // Step 6: The superseded refresh token no longer refreshes
        let stale_refresh = context
            .client
            .post(format!("{}/auth/refresh", context.base_url))
            .bearer_auth(&original_refresh)
            .send()
            .await
            .unwrap();
        assert_eq!(stale_refresh.status().as_u16(), 401);

        // Step 7: Logout with the ORIGINAL (stale) token still resolves the
        // session by id and kills it
        let logout_response = context
            .client
            .post(format!("{}/auth/logout", context.base_url))
            .bearer_auth(&original_refresh)
            .send()
            .await
            .unwrap();
        assert_eq!(logout_response.status().as_u16(), 200);

        // Step 8: The rotated token is dead too - the whole session is gone
        let post_logout_refresh = context
            .client
            .post(format!("{}/auth/refresh", context.base_url))
            .bearer_auth(&rotated_refresh)
            .send()
            .await
            .unwrap();
        assert_eq!(post_logout_refresh.status().as_u16(), 401);

        // Step 9: Logout is idempotent
        let second_logout = context
            .client
            .post(format!("{}/auth/logout", context.base_url))
            .bearer_auth(&original_refresh)
            .send()
            .await
            .unwrap();
        assert_eq!(second_logout.status().as_u16(), 200);

        // Step 10: The access token is refused once its session is inactive
        let dead_profile = context
            .client
            .get(format!("{}/auth/profile", context.base_url))
            .bearer_auth(&access_token)
            .send()
            .await
            .unwrap();
        assert_eq!(dead_profile.status().as_u16(), 401);
    }

    #[tokio::test]
    #[ignore]
    async fn test_login_rejections_are_uniform() {
        let context = TestContext::new();
        let timestamp = TestContext::get_timestamp();
        let email = format!("isolation_{}@example.com", timestamp);

        let reg_response = context
            .client
            .post(format!("{}/auth/register", context.base_url))
            .json(&json!({ "email": email, "password": "Abcdef1!" }))
            .send()
            .await
            .unwrap();
        assert_eq!(reg_response.status().as_u16(), 201);

        // Wrong password for a real account
        let wrong_password = context
            .client
            .post(format!("{}/auth/login", context.base_url))
            .json(&json!({ "email": email, "password": "Wrong1!aa" }))
            .send()
            .await
            .unwrap();

        // Unknown email entirely
        let unknown_email = context
            .client
            .post(format!("{}/auth/login", context.base_url))
            .json(&json!({
                "email": format!("nobody_{}@example.com", timestamp),
                "password": "Abcdef1!"
            }))
            .send()
            .await
            .unwrap();

        // Both cases are indistinguishable to the caller
        assert_eq!(wrong_password.status().as_u16(), 401);
        assert_eq!(unknown_email.status().as_u16(), 401);
        let wrong_body: Value = wrong_password.json().await.unwrap();
        let unknown_body: Value = unknown_email.json().await.unwrap();
        assert_eq!(wrong_body, unknown_body);
    }

    #[tokio::test]
    #[ignore]
    async fn test_weak_passwords_are_rejected_before_hashing() {
        let context = TestContext::new();
        let timestamp = TestContext::get_timestamp();

        for weak in ["short1!", "alllower1!", "ALLUPPER1!", "NoDigits!!", "NoSymbol11"] {
            let response = context
                .client
                .post(format!("{}/auth/register", context.base_url))
                .json(&json!({
                    "email": format!("weak_{}@example.com", timestamp),
                    "password": weak
                }))
                .send()
                .await
                .unwrap();
            assert_eq!(response.status().as_u16(), 422, "accepted weak password: {}", weak);
        }
    }
}
