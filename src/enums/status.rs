/// Enum with the HTTP status codes we know a reason phrase for.
///
/// Mock responses carry a bare numeric code, the phrase for the status line
/// is looked up here. Codes not listed have an empty phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    //  1xx status codes
    Continue,                       // 100
    SwitchingProtocol,              // 101
    //  2xx status codes
    Ok,                             // 200
    Created,                        // 201
    Accepted,                       // 202
    NonAuthoritativeInformation,    // 203
    NoContent,                      // 204
    ResetContent,                   // 205
    PartialContent,                 // 206
    //  3xx status codes
    MultipleChoices,                // 300
    MovedPermanently,               // 301
    Found,                          // 302
    SeeOther,                       // 303
    NotModified,                    // 304
    UseProxy,                       // 305
    TemporaryRedirect,              // 307
    PermanentRedirect,              // 308
    //  4xx status codes
    BadRequest,                     // 400
    Unauthorized,                   // 401
    PaymentRequired,                // 402
    Forbidden,                      // 403
    NotFound,                       // 404
    MethodNotAllowed,               // 405
    NotAcceptable,                  // 406
    ProxyAuthenticationRequired,    // 407
    RequestTimeout,                 // 408
    Conflict,                       // 409
    Gone,                           // 410
    LengthRequired,                 // 411
    PreconditionFailed,             // 412
    RequestEntityTooLarge,          // 413
    RequestURITooLong,              // 414
    UnsupportedMediaType,           // 415
    RequestRangeNotSatisfiable,     // 416
    ExpectationFailed,              // 417
    UpgradeRequired,                // 426
    TooManyRequests,                // 429
    //  5xx status codes
    InternalServerError,            // 500
    NotImplemented,                 // 501
    BadGateway,                     // 502
    ServiceUnavailable,             // 503
    GatewayTimeout,                 // 504
    VersionNotSupported,            // 505
}

const ALL: &[Status] = &[
    Status::Continue, Status::SwitchingProtocol,
    Status::Ok, Status::Created, Status::Accepted,
    Status::NonAuthoritativeInformation, Status::NoContent,
    Status::ResetContent, Status::PartialContent,
    Status::MultipleChoices, Status::MovedPermanently, Status::Found,
    Status::SeeOther, Status::NotModified, Status::UseProxy,
    Status::TemporaryRedirect, Status::PermanentRedirect,
    Status::BadRequest, Status::Unauthorized, Status::PaymentRequired,
    Status::Forbidden, Status::NotFound, Status::MethodNotAllowed,
    Status::NotAcceptable, Status::ProxyAuthenticationRequired,
    Status::RequestTimeout, Status::Conflict, Status::Gone,
    Status::LengthRequired, Status::PreconditionFailed,
    Status::RequestEntityTooLarge, Status::RequestURITooLong,
    Status::UnsupportedMediaType, Status::RequestRangeNotSatisfiable,
    Status::ExpectationFailed, Status::UpgradeRequired,
    Status::TooManyRequests,
    Status::InternalServerError, Status::NotImplemented, Status::BadGateway,
    Status::ServiceUnavailable, Status::GatewayTimeout,
    Status::VersionNotSupported,
];

impl Status {
    /// Find a known status by its numeric code
    pub fn from_code(code: u16) -> Option<Status> {
        ALL.iter().cloned().find(|s| s.code() == code)
    }

    pub fn code(&self) -> u16 {
        match *self {
            //  1xx Status codes
            Status::Continue                        => 100,
            Status::SwitchingProtocol               => 101,
            //  2xx status codes
            Status::Ok                              => 200,
            Status::Created                         => 201,
            Status::Accepted                        => 202,
            Status::NonAuthoritativeInformation     => 203,
            Status::NoContent                       => 204,
            Status::ResetContent                    => 205,
            Status::PartialContent                  => 206,
            //  3xx status codes
            Status::MultipleChoices                 => 300,
            Status::MovedPermanently                => 301,
            Status::Found                           => 302,
            Status::SeeOther                        => 303,
            Status::NotModified                     => 304,
            Status::UseProxy                        => 305,
            Status::TemporaryRedirect               => 307,
            Status::PermanentRedirect               => 308,
            //  4xx status codes
            Status::BadRequest                      => 400,
            Status::Unauthorized                    => 401,
            Status::PaymentRequired                 => 402,
            Status::Forbidden                       => 403,
            Status::NotFound                        => 404,
            Status::MethodNotAllowed                => 405,
            Status::NotAcceptable                   => 406,
            Status::ProxyAuthenticationRequired     => 407,
            Status::RequestTimeout                  => 408,
            Status::Conflict                        => 409,
            Status::Gone                            => 410,
            Status::LengthRequired                  => 411,
            Status::PreconditionFailed              => 412,
            Status::RequestEntityTooLarge           => 413,
            Status::RequestURITooLong               => 414,
            Status::UnsupportedMediaType            => 415,
            Status::RequestRangeNotSatisfiable      => 416,
            Status::ExpectationFailed               => 417,
            Status::UpgradeRequired                 => 426,
            Status::TooManyRequests                 => 429,
            //  5xx status codes
            Status::InternalServerError             => 500,
            Status::NotImplemented                  => 501,
            Status::BadGateway                      => 502,
            Status::ServiceUnavailable              => 503,
            Status::GatewayTimeout                  => 504,
            Status::VersionNotSupported             => 505,
        }
    }

    pub fn reason(&self) -> &'static str {
        match *self {
            //  1xx Status codes
            Status::Continue                        => "Continue",
            Status::SwitchingProtocol               => "Switching Protocols",
            //  2xx status codes
            Status::Ok                              => "OK",
            Status::Created                         => "Created",
            Status::Accepted                        => "Accepted",
            Status::NonAuthoritativeInformation     => "Non-Authoritative Information",
            Status::NoContent                       => "No Content",
            Status::ResetContent                    => "Reset Content",
            Status::PartialContent                  => "Partial Content",
            //  3xx status codes
            Status::MultipleChoices                 => "Multiple Choices",
            Status::MovedPermanently                => "Moved Permanently",
            Status::Found                           => "Found",
            Status::SeeOther                        => "See Other",
            Status::NotModified                     => "Not Modified",
            Status::UseProxy                        => "Use Proxy",
            Status::TemporaryRedirect               => "Temporary Redirect",
            Status::PermanentRedirect               => "Permanent Redirect",
            //  4xx status codes
            Status::BadRequest                      => "Bad Request",
            Status::Unauthorized                    => "Unauthorized",
            Status::PaymentRequired                 => "Payment Required",
            Status::Forbidden                       => "Forbidden",
            Status::NotFound                        => "Not Found",
            Status::MethodNotAllowed                => "Method Not Allowed",
            Status::NotAcceptable                   => "Not Acceptable",
            Status::ProxyAuthenticationRequired     => "Proxy Authentication Required",
            Status::RequestTimeout                  => "Request Timeout",
            Status::Conflict                        => "Conflict",
            Status::Gone                            => "Gone",
            Status::LengthRequired                  => "Length Required",
            Status::PreconditionFailed              => "Precondition Failed",
            Status::RequestEntityTooLarge           => "Request Entity Too Large",
            Status::RequestURITooLong               => "Request-URI Too Long",
            Status::UnsupportedMediaType            => "Unsupported Media Type",
            Status::RequestRangeNotSatisfiable      => "Request Range Not Satisfiable",
            Status::ExpectationFailed               => "Expectation Failed",
            Status::UpgradeRequired                 => "Upgrade Required",
            Status::TooManyRequests                 => "Too Many Requests",
            //  5xx status codes
            Status::InternalServerError             => "Internal Server Error",
            Status::NotImplemented                  => "Not Implemented",
            Status::BadGateway                      => "Bad Gateway",
            Status::ServiceUnavailable              => "Service Unavailable",
            Status::GatewayTimeout                  => "Gateway Timeout",
            Status::VersionNotSupported             => "HTTP Version Not Supported",
        }
    }
}

/// Reason phrase for an arbitrary numeric code, empty if unknown
pub fn reason_phrase(code: u16) -> &'static str {
    Status::from_code(code).map(|s| s.reason()).unwrap_or("")
}
