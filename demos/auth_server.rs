//! Protecting a route with HTTP Basic authentication.
//!
//! `curl -u admin:s3cret http://127.0.0.1:8080/admin` is let in; anything
//! else gets a 401 challenge.

use pocket_httpd::{protect, BasicAuth, HttpServer, Method, Response, ServerConfig, StatusCode};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let auth = BasicAuth::new("pocket-httpd admin")?
        .with_account("admin", "s3cret")?
        .with_account("operator", "letmein")?;

    let server = HttpServer::new(ServerConfig::default());

    server.add_route(
        "/admin",
        vec![Method::GET],
        protect(auth.clone(), |req| async move {
            // The credentials were already checked, so they are present here
            let user = BasicAuth::credentials(&req)
                .map(|(user, _)| user)
                .unwrap_or_default();
            Ok(Some(Response::text(StatusCode::Ok, format!("Welcome, {user}"))))
        }),
    );

    // A handler can also consult the realm directly
    server.add_route("/whoami", vec![Method::GET], move |req| {
        let auth = auth.clone();
        async move {
            match BasicAuth::credentials(&req) {
                Some((user, password)) if auth.validate(&user, &password) => {
                    Ok(Some(Response::text(StatusCode::Ok, user)))
                }
                _ => Ok(Some(Response::text(StatusCode::Ok, "anonymous"))),
            }
        }
    });

    server.run().await?;
    Ok(())
}
