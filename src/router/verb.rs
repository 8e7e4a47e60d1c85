use std::fmt;
use std::str::FromStr;

use http::Method;

/// HTTP verbs a route can be registered under.
///
/// This is a closed set: every verb maps uniformly to one [`PathTrie`](super::PathTrie)
/// inside a [`MethodRegistry`](super::MethodRegistry). Methods outside the set
/// (`TRACE`, `CONNECT`, extension methods) cannot be routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Head,
}

impl Verb {
    /// Every routable verb, in declaration order.
    pub const ALL: [Verb; 7] = [
        Verb::Get,
        Verb::Post,
        Verb::Put,
        Verb::Patch,
        Verb::Delete,
        Verb::Options,
        Verb::Head,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
            Verb::Options => "OPTIONS",
            Verb::Head => "HEAD",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a method name or [`http::Method`] has no [`Verb`] counterpart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVerb {
    /// The rejected method, as given
    pub method: String,
}

impl fmt::Display for UnknownVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported HTTP method '{}'", self.method)
    }
}

impl std::error::Error for UnknownVerb {}

impl FromStr for Verb {
    type Err = UnknownVerb;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Verb::ALL
            .into_iter()
            .find(|verb| verb.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownVerb {
                method: s.to_string(),
            })
    }
}

impl TryFrom<&Method> for Verb {
    type Error = UnknownVerb;

    fn try_from(method: &Method) -> Result<Self, Self::Error> {
        match *method {
            Method::GET => Ok(Verb::Get),
            Method::POST => Ok(Verb::Post),
            Method::PUT => Ok(Verb::Put),
            Method::PATCH => Ok(Verb::Patch),
            Method::DELETE => Ok(Verb::Delete),
            Method::OPTIONS => Ok(Verb::Options),
            Method::HEAD => Ok(Verb::Head),
            _ => Err(UnknownVerb {
                method: method.as_str().to_string(),
            }),
        }
    }
}

impl From<Verb> for Method {
    fn from(verb: Verb) -> Self {
        match verb {
            Verb::Get => Method::GET,
            Verb::Post => Method::POST,
            Verb::Put => Method::PUT,
            Verb::Patch => Method::PATCH,
            Verb::Delete => Method::DELETE,
            Verb::Options => Method::OPTIONS,
            Verb::Head => Method::HEAD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("get".parse::<Verb>(), Ok(Verb::Get));
        assert_eq!("Delete".parse::<Verb>(), Ok(Verb::Delete));
        assert_eq!("OPTIONS".parse::<Verb>(), Ok(Verb::Options));
    }

    #[test]
    fn test_unknown_verb_rejected() {
        let err = "TRACE".parse::<Verb>().unwrap_err();
        assert_eq!(err.method, "TRACE");
        assert!(Verb::try_from(&Method::CONNECT).is_err());
    }

    #[test]
    fn test_http_method_round_trip() {
        for verb in Verb::ALL {
            let method: Method = verb.into();
            assert_eq!(Verb::try_from(&method), Ok(verb));
            assert_eq!(method.as_str(), verb.as_str());
        }
    }
}
