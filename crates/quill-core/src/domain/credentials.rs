use std::fmt;

use url::Url;

use crate::error::CredentialError;

/// Everything needed to open a connection to the posts database.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseCredentials {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    /// Optional libpq `sslmode` (e.g. `require`).
    pub ssl_mode: Option<String>,
}

impl DatabaseCredentials {
    /// Parse a port given as text, as both the environment and vault payloads carry it.
    pub fn parse_port(raw: &str) -> Result<u16, CredentialError> {
        raw.trim()
            .parse()
            .map_err(|_| CredentialError::Malformed(format!("DATABASE_PORT '{raw}' is not a port")))
    }

    /// Build a `postgres://` connection URL with user, password and database
    /// name percent-encoded.
    pub fn connection_url(&self) -> Result<String, CredentialError> {
        let malformed = |what: &str| CredentialError::Malformed(format!("invalid {what}"));

        let mut url = Url::parse("postgres://localhost").map_err(|_| malformed("url"))?;
        url.set_host(Some(&self.host))
            .map_err(|_| malformed("DATABASE_HOST"))?;
        url.set_port(Some(self.port))
            .map_err(|_| malformed("DATABASE_PORT"))?;
        url.set_username(&self.user)
            .map_err(|_| malformed("DATABASE_USER"))?;
        url.set_password(Some(&self.password))
            .map_err(|_| malformed("DATABASE_PASS"))?;
        // A single path segment: `/`, `?` and `#` in the name are escaped, and
        // dot segments would be dropped by the URL parser.
        if matches!(self.database.as_str(), "." | "..") {
            return Err(malformed("DATABASE_NAME"));
        }
        url.path_segments_mut()
            .map_err(|_| malformed("url"))?
            .push(&self.database);

        if let Some(mode) = &self.ssl_mode {
            url.query_pairs_mut().append_pair("sslmode", mode);
        }

        Ok(url.into())
    }
}

impl fmt::Debug for DatabaseCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseCredentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> DatabaseCredentials {
        DatabaseCredentials {
            host: "db.internal".to_string(),
            port: 5432,
            user: "quill".to_string(),
            password: "p@ss/word".to_string(),
            database: "posts".to_string(),
            ssl_mode: None,
        }
    }

    #[test]
    fn test_connection_url_encodes_password() {
        let url = credentials().connection_url().unwrap();
        assert!(url.starts_with("postgres://quill:"));
        assert!(url.contains("p%40ss%2Fword"));
        assert!(url.ends_with("@db.internal:5432/posts"));
    }

    #[test]
    fn test_connection_url_appends_ssl_mode() {
        let mut creds = credentials();
        creds.ssl_mode = Some("require".to_string());
        let url = creds.connection_url().unwrap();
        assert!(url.ends_with("/posts?sslmode=require"));
    }

    #[test]
    fn test_connection_url_encodes_database_name() {
        let mut creds = credentials();
        creds.database = "a/b?c#d".to_string();
        let url = creds.connection_url().unwrap();
        assert!(url.ends_with("@db.internal:5432/a%2Fb%3Fc%23d"));

        let parsed = Url::parse(&url).unwrap();
        assert_eq!(parsed.query(), None);
        assert_eq!(parsed.path_segments().unwrap().count(), 1);

        creds.database = "..".to_string();
        assert!(matches!(
            creds.connection_url(),
            Err(CredentialError::Malformed(_))
        ));
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", credentials());
        assert!(!rendered.contains("p@ss/word"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn test_parse_port() {
        assert_eq!(DatabaseCredentials::parse_port(" 1433 ").unwrap(), 1433);
        assert!(DatabaseCredentials::parse_port("abc").is_err());
        assert!(DatabaseCredentials::parse_port("70000").is_err());
    }
}
