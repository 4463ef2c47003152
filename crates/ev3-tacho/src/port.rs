//! The port resolver seam.
//!
//! A port name like `outA` is served by a node of the lego-port class; the
//! device bound to the port appears as a subtree under that node. The
//! resolver maps the name to both, and nothing more; walking the subtree
//! down to the motor instance is the locator's job.

use std::path::Path;
use std::sync::Arc;

use tracing::trace;

use crate::error::Error;
use crate::paths::{attr, LEGO_PORT_CLASS};
use crate::store::{chomp, AttrStore};

/// A lego-port class node and the device subtree bound under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    /// Name of the class node serving the port, e.g. `port3`.
    pub node: String,
    /// Name of the device subtree bound under the node, e.g. `ev3-ports:outA`.
    pub device: String,
}

/// Maps a port name to the class node it is served by.
pub trait PortResolver {
    /// Resolves `port` to its node and bound device.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PortNotConnected`] when no node serves `port` or the
    /// serving node has no device bound to it.
    fn connected_to(&self, port: &str) -> Result<Connection, Error>;
}

/// Resolver over the sysfs lego-port class directory.
///
/// Matches each node's `address` attribute against the requested port name
/// and selects the node's single `:`-named child entry as the bound device;
/// plain entries are the node's own attribute files.
pub struct SysfsPortResolver<S> {
    store: Arc<S>,
}

impl<S: AttrStore> SysfsPortResolver<S> {
    /// A resolver reading port nodes from `store`.
    pub fn new(store: Arc<S>) -> Self {
        SysfsPortResolver { store }
    }
}

impl<S: AttrStore> PortResolver for SysfsPortResolver<S> {
    fn connected_to(&self, port: &str) -> Result<Connection, Error> {
        let class = Path::new(LEGO_PORT_CLASS);
        let nodes = self.store.list(class).map_err(|source| Error::List {
            path: class.to_path_buf(),
            source,
        })?;
        for node in nodes {
            let node_path = class.join(&node);
            let Ok(address) = self.store.read(&node_path.join(attr::ADDRESS)) else {
                continue;
            };
            if chomp(&address) != port {
                continue;
            }
            trace!(port, node = %node, "port served by lego-port node");
            let entries = self.store.list(&node_path).map_err(|source| Error::List {
                path: node_path.clone(),
                source,
            })?;
            return match entries.into_iter().find(|entry| entry.contains(':')) {
                Some(device) => Ok(Connection { node, device }),
                None => Err(Error::PortNotConnected {
                    port: port.to_owned(),
                }),
            };
        }
        Err(Error::PortNotConnected {
            port: port.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FakeStore;

    #[test]
    fn resolves_port_to_node_and_device() {
        let store = Arc::new(FakeStore::new());
        store.insert("lego-port/port3/address", "outA\n");
        store.mkdir("lego-port/port3/ev3-ports:outA");

        let resolver = SysfsPortResolver::new(store);
        let conn = resolver.connected_to("outA").unwrap();
        assert_eq!(
            conn,
            Connection {
                node: "port3".to_owned(),
                device: "ev3-ports:outA".to_owned(),
            }
        );
    }

    #[test]
    fn unknown_port_is_not_connected() {
        let store = Arc::new(FakeStore::new());
        store.insert("lego-port/port3/address", "outA\n");
        store.mkdir("lego-port/port3/ev3-ports:outA");

        let resolver = SysfsPortResolver::new(store);
        let err = resolver.connected_to("outB").unwrap_err();
        assert!(matches!(err, Error::PortNotConnected { port } if port == "outB"));
    }

    #[test]
    fn matching_node_without_device_is_not_connected() {
        let store = Arc::new(FakeStore::new());
        store.insert("lego-port/port3/address", "outA\n");

        let resolver = SysfsPortResolver::new(store);
        let err = resolver.connected_to("outA").unwrap_err();
        assert!(matches!(err, Error::PortNotConnected { .. }));
    }

    #[test]
    fn missing_class_directory_propagates_io_error() {
        let store = Arc::new(FakeStore::new());
        let resolver = SysfsPortResolver::new(store);
        let err = resolver.connected_to("outA").unwrap_err();
        assert!(matches!(err, Error::List { .. }));
    }
}
