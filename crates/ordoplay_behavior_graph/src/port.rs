// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port definitions for node inputs/outputs.

use crate::value::PropertyKind;
use serde::{Deserialize, Serialize};

/// Port direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortDirection {
    /// Input port
    Input,
    /// Output port
    Output,
}

/// What travels through a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortType {
    /// Execution flow
    Exec,
    /// A data value of the given kind
    Data(PropertyKind),
}

impl PortType {
    /// Check if this type can connect to another type
    pub fn can_connect_to(&self, other: &PortType) -> bool {
        match (self, other) {
            (Self::Exec, Self::Exec) => true,
            (Self::Data(from), Self::Data(to)) => from.can_convert_to(*to),
            _ => false,
        }
    }

    /// Check if this is a flow port
    pub fn is_exec(&self) -> bool {
        matches!(self, Self::Exec)
    }
}

/// A named port on a node type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    /// Port name, unique per direction on a node type
    pub name: String,
    /// Port direction
    pub direction: PortDirection,
    /// Port type
    pub port_type: PortType,
}

impl Port {
    /// Create a new input port
    pub fn input(name: impl Into<String>, port_type: PortType) -> Self {
        Self {
            name: name.into(),
            direction: PortDirection::Input,
            port_type,
        }
    }

    /// Create a new output port
    pub fn output(name: impl Into<String>, port_type: PortType) -> Self {
        Self {
            name: name.into(),
            direction: PortDirection::Output,
            port_type,
        }
    }

    /// Check if a connection from this port to another is valid
    pub fn can_connect(&self, other: &Port) -> bool {
        self.direction == PortDirection::Output
            && other.direction == PortDirection::Input
            && self.port_type.can_connect_to(&other.port_type)
    }
}

/// Declares a fixed set of port names for a built-in node.
///
/// Built-in nodes name their ports through these enums so a typo is a
/// compile error rather than a dangling connection.
macro_rules! node_ports {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $port:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every port, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Port name as stored on connections
            pub const fn name(self) -> &'static str {
                match self {
                    $( $name::$variant => $port ),+
                }
            }
        }

        impl From<$name> for String {
            fn from(port: $name) -> String {
                port.name().to_string()
            }
        }
    };
}

pub(crate) use node_ports;

#[cfg(test)]
mod tests {
    use super::*;

    node_ports! {
        enum Lanes {
            Left => "Left",
            Right => "Right",
        }
    }

    #[test]
    fn test_port_enum_names() {
        assert_eq!(Lanes::ALL.len(), 2);
        assert_eq!(Lanes::Right.name(), "Right");
        assert_eq!(String::from(Lanes::Left), "Left");
    }

    #[test]
    fn test_exec_only_connects_to_exec() {
        let exec_out = Port::output("Exec", PortType::Exec);
        let exec_in = Port::input("Exec", PortType::Exec);
        let float_in = Port::input("A", PortType::Data(PropertyKind::Float));

        assert!(exec_out.can_connect(&exec_in));
        assert!(!exec_out.can_connect(&float_in));
        assert!(!exec_in.can_connect(&exec_out));
    }

    #[test]
    fn test_data_conversion() {
        let float_out = Port::output("Result", PortType::Data(PropertyKind::Float));
        let vec_in = Port::input("Force", PortType::Data(PropertyKind::Vector3));
        let bool_in = Port::input("Condition", PortType::Data(PropertyKind::Bool));

        assert!(float_out.can_connect(&vec_in));
        assert!(!float_out.can_connect(&bool_in));
    }
}
