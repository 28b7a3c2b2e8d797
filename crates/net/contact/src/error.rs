//! Contact construction and endpoint-selection errors.

use std::net::IpAddr;

/// Errors from [`Contact`](crate::Contact) construction and mutation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContactError {
    /// A contact needs at least one local endpoint.
    #[error("at least one local endpoint is required")]
    NoLocalEndpoints,

    /// Local endpoints must all share one port.
    #[error("local endpoints do not share a single port")]
    MismatchedLocalPorts,

    /// A direct-connected contact cannot have a rendezvous endpoint.
    #[error("direct-connected contact cannot have a rendezvous endpoint")]
    RendezvousOnDirect,

    /// Well-known-port flags are only meaningful for direct-connected contacts.
    #[error("tcp443/tcp80 flags set on a contact that is not direct-connected")]
    PortFlagsOnRelayed,

    /// Preferred-endpoint selection found no endpoint with the given IP.
    #[error("no known endpoint with ip {ip}")]
    EndpointNotFound {
        /// The IP that matched none of the contact's endpoints.
        ip: IpAddr,
    },
}
