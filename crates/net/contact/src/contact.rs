use std::cmp::Ordering;
use std::net::IpAddr;

use meridian_primitives::NodeId;
use tracing::debug;

use crate::{ContactError, Endpoint};

/// The identity component of a [`Contact`].
///
/// A contact normally carries a known overlay identifier, but a peer first
/// seen on the wire may not have proven one yet; such "address-only" contacts
/// remain comparable by their external endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContactId {
    /// No identifier known; equality falls back to the external endpoint.
    AddressOnly,
    /// A known overlay identifier.
    Known(NodeId),
}

/// A peer's overlay identifier plus the endpoints needed to reach it.
///
/// Constructed through [`Contact::builder`], which enforces the
/// connectivity rules at build time:
///
/// - at least one local endpoint, all sharing one port;
/// - a direct-connected contact (external endpoint equals the first local
///   endpoint) must not have a rendezvous endpoint, though either well-known
///   port flag may be set;
/// - a contact that is not direct-connected must have both port flags false,
///   and may carry a rendezvous endpoint.
///
/// A contact is immutable once built except for preferred-endpoint
/// selection via [`set_preferred_endpoint`](Self::set_preferred_endpoint).
#[derive(Debug, Clone)]
pub struct Contact {
    id: ContactId,
    endpoint: Endpoint,
    local_endpoints: Vec<Endpoint>,
    rendezvous_endpoint: Option<Endpoint>,
    tcp443: bool,
    tcp80: bool,
    public_key_id: String,
    public_key: String,
    other_info: String,
    preferred_endpoint: Option<Endpoint>,
}

impl Contact {
    /// Starts building a contact with a known identifier and external endpoint.
    pub fn builder(node_id: NodeId, endpoint: Endpoint) -> ContactBuilder {
        ContactBuilder {
            id: node_id,
            endpoint,
            local_endpoints: Vec::new(),
            rendezvous_endpoint: None,
            tcp443: false,
            tcp80: false,
            public_key_id: String::new(),
            public_key: String::new(),
            other_info: String::new(),
        }
    }

    /// Creates a contact for a peer whose identifier is not yet known.
    ///
    /// Address-only contacts compare equal by external endpoint and sort
    /// before every identified contact; they carry no other metadata.
    pub fn address_only(endpoint: Endpoint) -> Self {
        Self {
            id: ContactId::AddressOnly,
            endpoint,
            local_endpoints: Vec::new(),
            rendezvous_endpoint: None,
            tcp443: false,
            tcp80: false,
            public_key_id: String::new(),
            public_key: String::new(),
            other_info: String::new(),
            preferred_endpoint: None,
        }
    }

    /// The identity component.
    pub fn id(&self) -> &ContactId {
        &self.id
    }

    /// The overlay identifier, if known.
    pub fn node_id(&self) -> Option<&NodeId> {
        match &self.id {
            ContactId::Known(id) => Some(id),
            ContactId::AddressOnly => None,
        }
    }

    /// The external endpoint.
    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    /// The local endpoints (all sharing one port).
    pub fn local_endpoints(&self) -> &[Endpoint] {
        &self.local_endpoints
    }

    /// The rendezvous (relay) endpoint, if any.
    pub fn rendezvous_endpoint(&self) -> Option<Endpoint> {
        self.rendezvous_endpoint
    }

    /// The external endpoint on TCP 443, if the contact listens there.
    pub fn tcp443_endpoint(&self) -> Option<Endpoint> {
        self.tcp443.then_some(self.endpoint)
    }

    /// The external endpoint on TCP 80, if the contact listens there.
    pub fn tcp80_endpoint(&self) -> Option<Endpoint> {
        self.tcp80.then_some(self.endpoint)
    }

    /// Identifier of the public key used to encrypt messages for this contact.
    pub fn public_key_id(&self) -> &str {
        &self.public_key_id
    }

    /// Public key used to encrypt messages for this contact.
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// Opaque extra information held for this contact.
    pub fn other_info(&self) -> &str {
        &self.other_info
    }

    /// True iff the contact is reachable at its external endpoint without
    /// relay: the external endpoint equals the first local endpoint and no
    /// rendezvous endpoint is set.
    pub fn is_directly_connected(&self) -> bool {
        self.rendezvous_endpoint.is_none()
            && self.local_endpoints.first() == Some(&self.endpoint)
    }

    /// Marks the known endpoint with the given IP as the one to dial.
    ///
    /// Scans the external endpoint, then the local endpoints, then the
    /// rendezvous endpoint. On no match the prior preference (if any) is
    /// left unchanged.
    pub fn set_preferred_endpoint(&mut self, ip: IpAddr) -> Result<(), ContactError> {
        let found = std::iter::once(&self.endpoint)
            .chain(self.local_endpoints.iter())
            .chain(self.rendezvous_endpoint.iter())
            .find(|endpoint| endpoint.ip() == ip)
            .copied();

        match found {
            Some(endpoint) => {
                self.preferred_endpoint = Some(endpoint);
                Ok(())
            }
            None => {
                debug!(contact = %self.endpoint, %ip, "no endpoint matches preferred ip");
                Err(ContactError::EndpointNotFound { ip })
            }
        }
    }

    /// The endpoint to dial: the selected preference, or the external
    /// endpoint if none has been set.
    pub fn preferred_endpoint(&self) -> Endpoint {
        self.preferred_endpoint.unwrap_or(self.endpoint)
    }
}

/// Equality is identifier-based, falling back to the external endpoint when
/// either side has no identifier.
impl PartialEq for Contact {
    fn eq(&self, other: &Self) -> bool {
        match (&self.id, &other.id) {
            (ContactId::Known(a), ContactId::Known(b)) => a == b,
            _ => self.endpoint == other.endpoint,
        }
    }
}

impl Eq for Contact {}

/// Ordering is by identifier only (address-only contacts sort first); it is
/// coarser than equality for address-only contacts.
impl PartialOrd for Contact {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Contact {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

/// Builder for [`Contact`]; validation happens in [`build`](Self::build).
#[derive(Debug)]
pub struct ContactBuilder {
    id: NodeId,
    endpoint: Endpoint,
    local_endpoints: Vec<Endpoint>,
    rendezvous_endpoint: Option<Endpoint>,
    tcp443: bool,
    tcp80: bool,
    public_key_id: String,
    public_key: String,
    other_info: String,
}

impl ContactBuilder {
    /// Adds a local endpoint. The first one added is the contact's primary
    /// local endpoint for the direct-connectedness rule.
    pub fn local_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.local_endpoints.push(endpoint);
        self
    }

    /// Adds several local endpoints.
    pub fn local_endpoints(mut self, endpoints: impl IntoIterator<Item = Endpoint>) -> Self {
        self.local_endpoints.extend(endpoints);
        self
    }

    /// Sets the rendezvous (relay) endpoint.
    pub fn rendezvous_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.rendezvous_endpoint = Some(endpoint);
        self
    }

    /// Marks the contact as listening on TCP 443.
    pub fn tcp443(mut self, listening: bool) -> Self {
        self.tcp443 = listening;
        self
    }

    /// Marks the contact as listening on TCP 80.
    pub fn tcp80(mut self, listening: bool) -> Self {
        self.tcp80 = listening;
        self
    }

    /// Sets the identifier of the contact's public key.
    pub fn public_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.public_key_id = key_id.into();
        self
    }

    /// Sets the contact's public key.
    pub fn public_key(mut self, key: impl Into<String>) -> Self {
        self.public_key = key.into();
        self
    }

    /// Sets opaque extra information.
    pub fn other_info(mut self, info: impl Into<String>) -> Self {
        self.other_info = info.into();
        self
    }

    /// Validates the connectivity rules and produces the contact.
    ///
    /// No partially-valid contact escapes a failed build.
    pub fn build(self) -> Result<Contact, ContactError> {
        let Some(first_local) = self.local_endpoints.first() else {
            return Err(ContactError::NoLocalEndpoints);
        };
        if self
            .local_endpoints
            .iter()
            .any(|endpoint| endpoint.port() != first_local.port())
        {
            return Err(ContactError::MismatchedLocalPorts);
        }

        if self.endpoint == *first_local {
            // Direct-connected: no relay allowed, port flags permitted.
            if self.rendezvous_endpoint.is_some() {
                return Err(ContactError::RendezvousOnDirect);
            }
        } else if self.tcp443 || self.tcp80 {
            return Err(ContactError::PortFlagsOnRelayed);
        }

        Ok(Contact {
            id: ContactId::Known(self.id),
            endpoint: self.endpoint,
            local_endpoints: self.local_endpoints,
            rendezvous_endpoint: self.rendezvous_endpoint,
            tcp443: self.tcp443,
            tcp80: self.tcp80,
            public_key_id: self.public_key_id,
            public_key: self.public_key,
            other_info: self.other_info,
            preferred_endpoint: None,
        })
    }
}
