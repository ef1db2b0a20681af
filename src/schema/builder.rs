// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::schema::{Attribute, AttributeType, FieldValue};
use crate::traits::InstanceRef;
use serde_json::Value;
use std::sync::Arc;

type Snapshot<C> = Arc<dyn Fn(&C) -> Value + Send + Sync>;
type Restore<C> = Arc<dyn Fn(&mut C, &Value) -> Result<(), String> + Send + Sync>;
type IsZero<C> = Arc<dyn Fn(&C) -> bool + Send + Sync>;
type GetRef<C> = Arc<dyn Fn(&C) -> Option<InstanceRef> + Send + Sync>;
type SetRef<C> = Arc<dyn Fn(&mut C, Option<InstanceRef>) + Send + Sync>;
type GetRefs<C> = Arc<dyn Fn(&C) -> Vec<InstanceRef> + Send + Sync>;
type SetRefs<C> = Arc<dyn Fn(&mut C, Vec<InstanceRef>) + Send + Sync>;

/// A configuration shape: one type that defines both the typed configuration
/// an instance applies and the attribute schema callers see.
///
/// ```
/// use the_rigging::schema::{Configuration, SchemaBuilder};
///
/// #[derive(Clone, Default)]
/// struct Listener {
///     listen: String,
///     backlog: u32,
/// }
///
/// impl Configuration for Listener {
///     fn describe(schema: &mut SchemaBuilder<Self>) {
///         schema.field("listen", |c| &c.listen, |c| &mut c.listen).required();
///         schema.field("backlog", |c| &c.backlog, |c| &mut c.backlog).default("128");
///     }
/// }
///
/// let names: Vec<_> = Listener::schema().attributes().into_iter().map(|a| a.name).collect();
/// assert_eq!(names, vec!["listen", "backlog"]);
/// ```
pub trait Configuration: Default + Clone + Send + Sync + 'static {
    fn describe(schema: &mut SchemaBuilder<Self>);

    fn schema() -> Schema<Self> {
        let mut builder = SchemaBuilder::new();
        Self::describe(&mut builder);
        builder.build()
    }
}

/// How a field is read from and written to its configuration.
pub(crate) enum Access<C> {
    Value {
        snapshot: Snapshot<C>,
        restore: Restore<C>,
        is_zero: IsZero<C>,
    },
    Reference {
        get: GetRef<C>,
        set: SetRef<C>,
    },
    References {
        get: GetRefs<C>,
        set: SetRefs<C>,
    },
}

pub struct Field<C> {
    pub(crate) attribute: Attribute,
    pub(crate) access: Access<C>,
    excluded: bool,
}

impl<C> Field<C> {
    pub fn attribute(&self) -> &Attribute {
        &self.attribute
    }
}

/// Ordered attribute schema together with the accessors for each field.
pub struct Schema<C> {
    fields: Vec<Field<C>>,
}

impl<C> Schema<C> {
    /// A schema with no fields; what a configuration without any registered
    /// fields produces.
    pub fn empty() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn attributes(&self) -> Vec<Attribute> {
        self.fields.iter().map(|f| f.attribute.clone()).collect()
    }

    pub fn fields(&self) -> &[Field<C>] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&Field<C>> {
        self.fields.iter().find(|f| f.attribute.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Collects field registrations for a [`Configuration`].
pub struct SchemaBuilder<C> {
    fields: Vec<Field<C>>,
}

impl<C> Default for SchemaBuilder<C> {
    fn default() -> Self {
        Self { fields: Vec::new() }
    }
}

impl<C: Send + Sync + 'static> SchemaBuilder<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a plain field. The declared type follows `T`.
    pub fn field<T, G, M>(&mut self, name: &str, get: G, get_mut: M) -> AttributeBuilder<'_>
    where
        T: FieldValue,
        G: Fn(&C) -> &T + Send + Sync + 'static,
        M: Fn(&mut C) -> &mut T + Send + Sync + 'static,
    {
        let get = Arc::new(get);
        let snapshot: Snapshot<C> = {
            let get = Arc::clone(&get);
            Arc::new(move |config: &C| get(config).to_value())
        };
        let is_zero: IsZero<C> = Arc::new(move |config: &C| get(config).is_zero());
        let restore: Restore<C> = Arc::new(move |config: &mut C, value: &Value| {
            *get_mut(config) = T::from_value(value)?;
            Ok(())
        });

        self.push(
            Attribute::new(name, T::attribute_type()),
            Access::Value {
                snapshot,
                restore,
                is_zero,
            },
        )
    }

    /// Registers a field holding a handle to one other instance.
    pub fn reference<G, M>(&mut self, name: &str, get: G, get_mut: M) -> AttributeBuilder<'_>
    where
        G: Fn(&C) -> &Option<InstanceRef> + Send + Sync + 'static,
        M: Fn(&mut C) -> &mut Option<InstanceRef> + Send + Sync + 'static,
    {
        self.push(
            Attribute::new(name, AttributeType::Reference),
            Access::Reference {
                get: Arc::new(move |config: &C| get(config).clone()),
                set: Arc::new(move |config: &mut C, instance: Option<InstanceRef>| {
                    *get_mut(config) = instance;
                }),
            },
        )
    }

    /// Registers a field holding handles to several other instances.
    pub fn references<G, M>(&mut self, name: &str, get: G, get_mut: M) -> AttributeBuilder<'_>
    where
        G: Fn(&C) -> &Vec<InstanceRef> + Send + Sync + 'static,
        M: Fn(&mut C) -> &mut Vec<InstanceRef> + Send + Sync + 'static,
    {
        self.push(
            Attribute::new(name, AttributeType::ReferenceList),
            Access::References {
                get: Arc::new(move |config: &C| get(config).clone()),
                set: Arc::new(move |config: &mut C, instances: Vec<InstanceRef>| {
                    *get_mut(config) = instances;
                }),
            },
        )
    }

    /// Flattens the fields of a nested configuration into this one, each
    /// name prefixed with `prefix`.
    pub fn embed<E, G, M>(&mut self, prefix: &str, get: G, get_mut: M)
    where
        E: Configuration,
        G: Fn(&C) -> &E + Send + Sync + 'static,
        M: Fn(&mut C) -> &mut E + Send + Sync + 'static,
    {
        let get = Arc::new(get);
        let get_mut = Arc::new(get_mut);

        for field in E::schema().fields {
            let mut attribute = field.attribute;
            attribute.name = format!("{}{}", prefix, attribute.name);

            let access = match field.access {
                Access::Value {
                    snapshot,
                    restore,
                    is_zero,
                } => Access::Value {
                    snapshot: {
                        let get = Arc::clone(&get);
                        Arc::new(move |config: &C| snapshot(get(config)))
                    },
                    restore: {
                        let get_mut = Arc::clone(&get_mut);
                        Arc::new(move |config: &mut C, value: &Value| restore(get_mut(config), value))
                    },
                    is_zero: {
                        let get = Arc::clone(&get);
                        Arc::new(move |config: &C| is_zero(get(config)))
                    },
                },
                Access::Reference { get: inner, set } => Access::Reference {
                    get: {
                        let get = Arc::clone(&get);
                        Arc::new(move |config: &C| inner(get(config)))
                    },
                    set: {
                        let get_mut = Arc::clone(&get_mut);
                        Arc::new(move |config: &mut C, instance: Option<InstanceRef>| {
                            set(get_mut(config), instance)
                        })
                    },
                },
                Access::References { get: inner, set } => Access::References {
                    get: {
                        let get = Arc::clone(&get);
                        Arc::new(move |config: &C| inner(get(config)))
                    },
                    set: {
                        let get_mut = Arc::clone(&get_mut);
                        Arc::new(move |config: &mut C, instances: Vec<InstanceRef>| {
                            set(get_mut(config), instances)
                        })
                    },
                },
            };

            self.fields.push(Field {
                attribute,
                access,
                excluded: false,
            });
        }
    }

    fn push(&mut self, attribute: Attribute, access: Access<C>) -> AttributeBuilder<'_> {
        let index = self.fields.len();
        self.fields.push(Field {
            attribute,
            access,
            excluded: false,
        });
        let field = &mut self.fields[index];
        AttributeBuilder {
            attribute: &mut field.attribute,
            excluded: &mut field.excluded,
        }
    }

    pub fn build(self) -> Schema<C> {
        let fields = self
            .fields
            .into_iter()
            .filter(|f| !f.excluded && !f.attribute.name.is_empty() && f.attribute.name != "-")
            .map(|mut f| {
                if f.attribute.default.is_some() {
                    f.attribute.required = false;
                }
                f
            })
            .collect();
        Schema { fields }
    }
}

/// Modifiers for the attribute just registered.
pub struct AttributeBuilder<'a> {
    attribute: &'a mut Attribute,
    excluded: &'a mut bool,
}

impl AttributeBuilder<'_> {
    pub fn help(&mut self, text: &str) -> &mut Self {
        self.attribute.description = text.to_string();
        self
    }

    /// Literal applied when the key is absent; parsed per the declared type.
    pub fn default(&mut self, literal: &str) -> &mut Self {
        self.attribute.default = Some(literal.to_string());
        self
    }

    pub fn required(&mut self) -> &mut Self {
        self.attribute.required = true;
        self
    }

    pub fn sensitive(&mut self) -> &mut Self {
        self.attribute.sensitive = true;
        self
    }

    pub fn read_only(&mut self) -> &mut Self {
        self.attribute.read_only = true;
        self
    }

    /// Overrides the declared type reported in the schema.
    pub fn declare(&mut self, kind: AttributeType) -> &mut Self {
        self.attribute.reference = matches!(kind, AttributeType::Reference | AttributeType::ReferenceList);
        self.attribute.kind = kind;
        self
    }

    /// Resource type name a reference must resolve to.
    pub fn target(&mut self, resource: &str) -> &mut Self {
        self.attribute.target = Some(resource.to_string());
        self
    }

    pub fn exclude(&mut self) -> &mut Self {
        *self.excluded = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{references_in, State};
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct Tls {
        cert: String,
        verify: bool,
    }

    impl Configuration for Tls {
        fn describe(schema: &mut SchemaBuilder<Self>) {
            schema.field("cert", |c| &c.cert, |c| &mut c.cert).declare(AttributeType::Named("file".to_string()));
            schema.field("verify", |c| &c.verify, |c| &mut c.verify).default("true");
        }
    }

    #[derive(Clone, Default)]
    struct Listener {
        listen: String,
        timeout: Duration,
        password: String,
        scratch: String,
        unnamed: u8,
        upstream: Option<InstanceRef>,
        tls: Tls,
        endpoint: String,
    }

    impl Configuration for Listener {
        fn describe(schema: &mut SchemaBuilder<Self>) {
            schema.field("listen", |c| &c.listen, |c| &mut c.listen).required().help("Bind address");
            schema.field("timeout", |c| &c.timeout, |c| &mut c.timeout).required().default("5m");
            schema.field("password", |c| &c.password, |c| &mut c.password).sensitive();
            schema.field("scratch", |c| &c.scratch, |c| &mut c.scratch).exclude();
            schema.field("-", |c| &c.unnamed, |c| &mut c.unnamed);
            schema.reference("upstream", |c| &c.upstream, |c| &mut c.upstream).target("router");
            schema.embed("tls.", |c| &c.tls, |c| &mut c.tls);
            schema.field("endpoint", |c| &c.endpoint, |c| &mut c.endpoint).read_only();
        }
    }

    #[derive(Clone, Default)]
    struct Nothing;

    impl Configuration for Nothing {
        fn describe(_: &mut SchemaBuilder<Self>) {}
    }

    #[test]
    fn test_attribute_order_and_exclusion() {
        let names: Vec<String> = Listener::schema().attributes().into_iter().map(|a| a.name).collect();

        assert_eq!(
            names,
            vec!["listen", "timeout", "password", "upstream", "tls.cert", "tls.verify", "endpoint"]
        );
    }

    #[test]
    fn test_default_implies_optional() {
        let schema = Listener::schema();
        let timeout = schema.get("timeout").unwrap().attribute();

        assert!(!timeout.required);
        assert_eq!(timeout.default.as_deref(), Some("5m"));
        assert_eq!(timeout.kind, AttributeType::Duration);
        assert!(schema.get("listen").unwrap().attribute().required);
    }

    #[test]
    fn test_flags_and_overrides() {
        let schema = Listener::schema();

        assert!(schema.get("password").unwrap().attribute().sensitive);
        assert!(schema.get("endpoint").unwrap().attribute().read_only);
        assert_eq!(
            schema.get("tls.cert").unwrap().attribute().kind,
            AttributeType::Named("file".to_string())
        );

        let upstream = schema.get("upstream").unwrap().attribute();
        assert!(upstream.reference);
        assert_eq!(upstream.target.as_deref(), Some("router"));
    }

    #[test]
    fn test_declared_type_drives_reference_flag() {
        #[derive(Clone, Default)]
        struct Proxy {
            backend: String,
            mirrors: Vec<String>,
            origin: Option<InstanceRef>,
        }

        impl Configuration for Proxy {
            fn describe(schema: &mut SchemaBuilder<Self>) {
                schema.field("backend", |c| &c.backend, |c| &mut c.backend).declare(AttributeType::Reference);
                schema.field("mirrors", |c| &c.mirrors, |c| &mut c.mirrors).declare(AttributeType::ReferenceList);
                schema
                    .reference("origin", |c| &c.origin, |c| &mut c.origin)
                    .declare(AttributeType::Named("url".to_string()));
            }
        }

        let schema = Proxy::schema();
        assert!(schema.get("backend").unwrap().attribute().reference);
        assert!(schema.get("mirrors").unwrap().attribute().reference);
        assert!(!schema.get("origin").unwrap().attribute().reference);

        let state = State::new()
            .with("backend", "node-1")
            .with("mirrors", serde_json::json!(["node-2", "node-1"]))
            .with("origin", "node-9");
        assert_eq!(references_in(&schema.attributes(), &state), vec!["node-1", "node-2"]);
    }

    #[test]
    fn test_fieldless_configuration_yields_empty_schema() {
        assert!(Nothing::schema().is_empty());
        assert!(Schema::<Nothing>::empty().attributes().is_empty());
    }
}
