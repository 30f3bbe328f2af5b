#[cfg(test)]
mod tests {
    use crate::schemas::ApiDoc;
    use utoipa::openapi::{schema::Schema, PathItemType, RefOr};
    use utoipa::OpenApi;

    fn object_properties(name: &str) -> Vec<String> {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.expect("components should be generated");
        match components.schemas.get(name) {
            Some(RefOr::T(Schema::Object(obj))) => obj.properties.keys().cloned().collect(),
            _ => panic!("{name} should be an object schema"),
        }
    }

    #[test]
    fn test_openapi_schema_generation() {
        let openapi = ApiDoc::openapi();

        let components = openapi.components.as_ref().unwrap();
        for schema in ["ErrorResponse", "HealthResponse", "UserResponse", "ArtistResponse", "TokenResponse"] {
            assert!(components.schemas.contains_key(schema), "missing {schema}");
        }
        assert!(components.security_schemes.contains_key("bearer"));
        assert!(components.security_schemes.contains_key("basic"));

        assert!(serde_json::to_string(&openapi).is_ok());
    }

    #[test]
    fn test_error_response_schema_structure() {
        let properties = object_properties("ErrorResponse");

        assert!(properties.contains(&"error".to_string()));
        assert!(properties.contains(&"details".to_string()));
    }

    #[test]
    fn test_user_response_hides_credentials() {
        let properties = object_properties("UserResponse");

        assert_eq!(properties.len(), 4);
        for field in ["id", "username", "email", "is_admin"] {
            assert!(properties.contains(&field.to_string()), "missing {field}");
        }
    }

    #[test]
    fn test_openapi_paths() {
        let openapi = ApiDoc::openapi();
        let paths = &openapi.paths.paths;

        let expected = [
            ("/health", vec![PathItemType::Get]),
            ("/users", vec![PathItemType::Get, PathItemType::Post]),
            ("/users/{user_id}", vec![PathItemType::Get, PathItemType::Put, PathItemType::Delete]),
            ("/tokens", vec![PathItemType::Post, PathItemType::Delete]),
            ("/artists", vec![PathItemType::Get, PathItemType::Post]),
            ("/artists/{artist_id}", vec![PathItemType::Get, PathItemType::Put, PathItemType::Delete]),
        ];
        for (path, methods) in expected {
            let item = paths.get(path).unwrap_or_else(|| panic!("missing path {path}"));
            for method in methods {
                assert!(item.operations.contains_key(&method), "missing {method:?} {path}");
            }
        }

        let health = paths["/health"].operations.get(&PathItemType::Get).unwrap();
        assert!(health.responses.responses.contains_key("200"));
        assert!(health.responses.responses.contains_key("503"));
    }

    #[test]
    fn test_all_error_responses_reference_correct_schema() {
        let openapi_json = serde_json::to_string(&ApiDoc::openapi()).unwrap();

        assert!(!openapi_json.contains("crate.schemas.ErrorResponse"));
        assert!(!openapi_json.contains("crate::schemas::ErrorResponse"));
        assert!(openapi_json.contains("#/components/schemas/ErrorResponse"));
    }
}
