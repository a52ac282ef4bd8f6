//! Declarative helpers used by node implementations and by
//! `ethology-derive`'s generated code. The `get_input!`/`set_output!` pair is
//! the only part most node authors interact with directly.

/// Reads a node's input port. Thin sugar over `NodeConfig::get_input` that
/// lets the call site write `get_input!(self, "value")` instead of naming
/// the type explicitly.
#[macro_export]
#[doc(hidden)]
macro_rules! __get_input {
    ($self:ident, $k:expr) => {
        $self.config.get_input(&$k)
    };
}
#[doc(inline)]
pub use __get_input as get_input;

/// Writes a node's output port. Thin sugar over `NodeConfig::set_output`.
#[macro_export]
#[doc(hidden)]
macro_rules! __set_output {
    ($self:ident, $k:expr, $v:expr) => {
        $self.config.set_output(&$k, $v)
    };
}
#[doc(inline)]
pub use __set_output as set_output;

/// Implements `StringInto<T>` (and `StringInto<Vec<T>>`, `;`-delimited) for
/// any type implementing `FromStr`, by deferring to `parse()`.
#[doc(hidden)]
macro_rules! __impl_string_into {
    ( $($t:ty),* ) => {
        $(
            impl<S> $crate::basic_types::StringInto<$t> for S
            where
                S: AsRef<str>,
            {
                type Err = <$t as std::str::FromStr>::Err;

                fn string_into(&self) -> Result<$t, Self::Err> {
                    self.as_ref().parse()
                }
            }

            impl<S> $crate::basic_types::StringInto<Vec<$t>> for S
            where
                S: AsRef<str>,
            {
                type Err = <$t as std::str::FromStr>::Err;

                fn string_into(&self) -> Result<Vec<$t>, Self::Err> {
                    self.as_ref().split(';').map(|x| x.parse()).collect()
                }
            }
        )*
    };
}
#[doc(inline)]
pub(crate) use __impl_string_into as impl_string_into;

/// Implements `BTToString` for any type implementing `Display`, plus
/// `Vec<T>` as a `;`-joined string.
#[doc(hidden)]
macro_rules! __impl_into_string {
    ( $($t:ty),* ) => {
        $(
            impl $crate::basic_types::BTToString for $t {
                fn bt_to_string(&self) -> String {
                    self.to_string()
                }
            }

            impl $crate::basic_types::BTToString for Vec<$t> {
                fn bt_to_string(&self) -> String {
                    self.iter().map(|x| x.bt_to_string()).collect::<Vec<String>>().join(";")
                }
            }
        )*
    };
}
#[doc(inline)]
pub(crate) use __impl_into_string as impl_into_string;

/// Collects `Port::input(...)`/`Port::output(...)` builders into a
/// `PortsList`, for use in `provided_ports()` implementations.
#[macro_export]
#[doc(hidden)]
macro_rules! __define_ports {
    ( $($port:expr),* $(,)? ) => {{
        let mut ports = $crate::basic_types::PortsList::new();
        $(
            let (name, info) = $port.into_pair();
            ports.insert(name, info);
        )*
        ports
    }};
}
#[doc(inline)]
pub use __define_ports as define_ports;

/// Builds a fresh `$node_type::new(config)` against the factory's root
/// blackboard and registers it as an action node under `$id`.
#[macro_export]
#[doc(hidden)]
macro_rules! __register_action_node {
    ($factory:ident, $id:expr, $node_type:ty) => {{
        let config = $crate::nodes::NodeConfig::new($factory.blackboard(), $factory.wakeup());
        let node = <$node_type>::new(config);
        $factory.register_node($id, $crate::xml_loader::NodePtrType::Action(Box::new(node)))
    }};
}
#[doc(inline)]
pub use __register_action_node as register_action_node;
