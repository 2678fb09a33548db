/// Close status codes of RFC6455
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reason {
    NormalClosure,
    GoingAway,
    ProtocolError,
    UnsupportedData,
    Reserved,
    NoStatusReceived,
    AbnormalClosure,
    InvalidPayloadData,
    PolicyViolation,
    MessageTooBig,
    MandatoryExtension,
    InternalError,
    ServiceRestart,
    TryAgainLater,
    BadGateway,
    TlsHandshake,
}

const ALL: &[Reason] = &[
    Reason::NormalClosure,
    Reason::GoingAway,
    Reason::ProtocolError,
    Reason::UnsupportedData,
    Reason::Reserved,
    Reason::NoStatusReceived,
    Reason::AbnormalClosure,
    Reason::InvalidPayloadData,
    Reason::PolicyViolation,
    Reason::MessageTooBig,
    Reason::MandatoryExtension,
    Reason::InternalError,
    Reason::ServiceRestart,
    Reason::TryAgainLater,
    Reason::BadGateway,
    Reason::TlsHandshake,
];

impl Reason {
    pub fn code(&self) -> u16 {
        use self::Reason::*;
        match *self {
            NormalClosure       => 1000,
            GoingAway           => 1001,
            ProtocolError       => 1002,
            UnsupportedData     => 1003,
            Reserved            => 1004,
            NoStatusReceived    => 1005,
            AbnormalClosure     => 1006,
            InvalidPayloadData  => 1007,
            PolicyViolation     => 1008,
            MessageTooBig       => 1009,
            MandatoryExtension  => 1010,
            InternalError       => 1011,
            ServiceRestart      => 1012,
            TryAgainLater       => 1013,
            BadGateway          => 1014,
            TlsHandshake        => 1015,
        }
    }

    pub fn from_code(code: u16) -> Option<Reason> {
        ALL.iter().find(|r| r.code() == code).cloned()
    }

    /// Reason text sent along with the code
    pub fn message(&self) -> &'static str {
        use self::Reason::*;
        match *self {
            NormalClosure       => "Normal Closure",
            GoingAway           => "Going Away",
            ProtocolError       => "Protocol Error",
            UnsupportedData     => "Unsupported Data",
            Reserved            => "Reserved",
            NoStatusReceived    => "No Status Received",
            AbnormalClosure     => "Abnormal Closure",
            InvalidPayloadData  => "Invalid Payload Data",
            PolicyViolation     => "Policy Violation",
            MessageTooBig       => "Message Too Big",
            MandatoryExtension  => "Mandatory Extension",
            InternalError       => "Internal Error",
            ServiceRestart      => "Service Restart",
            TryAgainLater       => "Try Again Later",
            BadGateway          => "Bad Gateway",
            TlsHandshake        => "TLS Handshake",
        }
    }
}
