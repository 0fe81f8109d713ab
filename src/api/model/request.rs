use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;

use crate::model::config::ProviderConnection;
use crate::resolver_error::{create_resolver_error_result, ResolverError, ResolverErrorKind};

fn decode_base64(value: &str) -> Option<Vec<u8>> {
    [&URL_SAFE_NO_PAD, &URL_SAFE, &STANDARD, &STANDARD_NO_PAD].iter()
        .find_map(|engine| engine.decode(value).ok())
}

/// Decodes the `userConf` path segment, base64 encoded json `{baseURL, username, password}`.
pub fn decode_user_conf(user_conf: &str) -> Result<ProviderConnection, ResolverError> {
    let Some(bytes) = decode_base64(user_conf.trim()) else {
        return create_resolver_error_result!(ResolverErrorKind::Info, "user configuration is not base64 encoded");
    };
    let mut connection = match serde_json::from_slice::<ProviderConnection>(&bytes) {
        Ok(connection) => connection,
        Err(err) => return create_resolver_error_result!(ResolverErrorKind::Info, "invalid user configuration: {err}"),
    };
    connection.prepare();
    if connection.is_valid() {
        Ok(connection)
    } else {
        create_resolver_error_result!(ResolverErrorKind::Info, "user configuration without provider url")
    }
}

#[cfg(test)]
mod tests {
    use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
    use base64::Engine;

    use crate::api::model::request::decode_user_conf;
    use crate::model::config::ProviderConnection;

    #[test]
    fn test_decode_user_conf() {
        let json = r#"{"baseURL":"http://iptv.local:8080/","username":"john","password":"s3cr?t>"}"#;
        let expected = ProviderConnection::new("http://iptv.local:8080", "john", "s3cr?t>");
        assert_eq!(decode_user_conf(&URL_SAFE_NO_PAD.encode(json)).unwrap(), expected);
        assert_eq!(decode_user_conf(&STANDARD.encode(json)).unwrap(), expected);
    }

    #[test]
    fn test_decode_invalid_user_conf() {
        assert!(decode_user_conf("%%%").is_err());
        assert!(decode_user_conf(&STANDARD.encode("not json")).is_err());
        assert!(decode_user_conf(&STANDARD.encode(r#"{"baseURL":" ","username":"u"}"#)).is_err());
    }
}
