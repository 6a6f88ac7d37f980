use std::fmt;

/// The four endpoints the engine serves, plus everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Get,
    Set,
    Results,
    Ping,
    Unknown,
}

impl Route {
    /// Map the first path segment to a route. Matching is exact and
    /// case-sensitive.
    pub fn from_token(token: &str) -> Self {
        match token {
            "get" => Route::Get,
            "set" => Route::Set,
            "results" => Route::Results,
            "ping" => Route::Ping,
            _ => Route::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Get => "get",
            Route::Set => "set",
            Route::Results => "results",
            Route::Ping => "ping",
            Route::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_routes() {
        for route in [Route::Get, Route::Set, Route::Results, Route::Ping] {
            assert_eq!(Route::from_token(route.as_str()), route);
        }
    }

    #[test]
    fn test_unknown_routes() {
        assert_eq!(Route::from_token(""), Route::Unknown);
        assert_eq!(Route::from_token("GET"), Route::Unknown);
        assert_eq!(Route::from_token("health"), Route::Unknown);
    }
}
