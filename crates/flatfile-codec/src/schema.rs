//! Validated record schemas.
//!
//! [`SchemaBuilder`] turns a [`RecordDescription`] into an immutable
//! [`Schema`]: it checks the mode marker and field declarations, resolves
//! each field's conversion in the registry, and orders the fields. Schemas
//! are cached per record type, so building processors repeatedly for the
//! same type is cheap.
//!
//! # Validation order
//!
//! The builder stops at the first failure:
//!
//! 1. missing mode marker
//! 2. duplicate mode marker
//! 3. no fields declared
//! 4. field layout does not match the mode
//! 5. zero-length field
//! 6. duplicate field name
//! 7. duplicate order (sequential only)
//! 8. unresolved or invalid conversion

use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use flatfile_model::{Conversion, FieldLayout, LineMode, ValueKind};

use crate::codec;
use crate::convert::{BoxError, ConversionRegistry};
use crate::description::{FieldAccess, FlatRecord, RecordDescription, ResolveError};
use crate::error::{EncodeError, LineError, SchemaError};

/// Resolved metadata for one record field.
pub struct FieldDescriptor<R> {
    name: &'static str,
    kind: ValueKind,
    type_name: &'static str,
    layout: FieldLayout,
    offset: usize,
    conversion: Conversion,
    access: Box<dyn FieldAccess<R>>,
}

impl<R> FieldDescriptor<R> {
    /// Field name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Semantic kind of the field value.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Name of the field's value type.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Declared layout.
    #[must_use]
    pub fn layout(&self) -> FieldLayout {
        self.layout
    }

    /// Character offset of the field within a line.
    ///
    /// For sequential fields this is the sum of the lengths of all fields
    /// ordered before it.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of characters the field occupies.
    #[must_use]
    pub fn length(&self) -> usize {
        self.layout.length()
    }

    /// One past the last character the field occupies.
    #[must_use]
    pub fn end(&self) -> usize {
        self.offset + self.layout.length()
    }

    /// Conversion rule, with parameters prepared at build time.
    #[must_use]
    pub fn conversion(&self) -> &Conversion {
        &self.conversion
    }

    pub(crate) fn decode_into(&self, record: &mut R, text: &str) -> Result<(), BoxError> {
        self.access.decode_into(record, text, &self.conversion)
    }

    pub(crate) fn encode_from(&self, record: &R) -> Result<String, BoxError> {
        self.access.encode_from(record, &self.conversion)
    }
}

impl<R> std::fmt::Debug for FieldDescriptor<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("type_name", &self.type_name)
            .field("layout", &self.layout)
            .field("offset", &self.offset)
            .field("conversion", &self.conversion)
            .finish_non_exhaustive()
    }
}

/// Validated, ordered field layout for one record type.
///
/// Immutable after construction and safe to share across threads.
pub struct Schema<R> {
    record: &'static str,
    mode: LineMode,
    fields: Vec<FieldDescriptor<R>>,
    physical: Vec<usize>,
    width: usize,
    overlap: Option<(usize, usize)>,
}

impl<R> Schema<R> {
    /// Record type name.
    #[must_use]
    pub fn record_name(&self) -> &'static str {
        self.record
    }

    /// Line mode.
    #[must_use]
    pub fn mode(&self) -> LineMode {
        self.mode
    }

    /// Fields in decode order: by declared order for sequential records, by
    /// declaration for positional records.
    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor<R>] {
        &self.fields
    }

    /// Look up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor<R>> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Fields sorted by their position in the line.
    pub fn physical_fields(&self) -> impl Iterator<Item = &FieldDescriptor<R>> + '_ {
        self.physical.iter().map(|&idx| &self.fields[idx])
    }

    /// Width of an encoded line.
    ///
    /// For sequential records this is also the exact length every decoded
    /// line must have; for positional records it is the furthest reach of
    /// any field.
    #[must_use]
    pub fn line_width(&self) -> usize {
        self.width
    }

    /// First pair of positional fields whose ranges overlap, if any.
    #[must_use]
    pub fn overlapping_fields(&self) -> Option<(&FieldDescriptor<R>, &FieldDescriptor<R>)> {
        self.overlap
            .map(|(first, second)| (&self.fields[first], &self.fields[second]))
    }

    /// Encode a record into a line.
    pub fn encode(&self, record: &R) -> Result<String, EncodeError> {
        codec::encode(self, record)
    }
}

impl<R: Default> Schema<R> {
    /// Decode one line into a fresh record.
    pub fn decode(&self, line: &str, line_number: usize) -> Result<R, LineError> {
        codec::decode(self, line, line_number)
    }
}

impl<R: FlatRecord> Schema<R> {
    /// Schema for `R` from the process-wide default builder.
    pub fn of() -> Result<Arc<Self>, SchemaError> {
        default_builder().schema::<R>()
    }
}

impl<R> std::fmt::Debug for Schema<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("record", &self.record)
            .field("mode", &self.mode)
            .field("width", &self.width)
            .field("fields", &self.fields)
            .finish()
    }
}

type CachedSchema = Arc<dyn Any + Send + Sync>;

/// Builds schemas from record descriptions and caches them per record type.
pub struct SchemaBuilder {
    registry: ConversionRegistry,
    cache: RwLock<HashMap<TypeId, CachedSchema>>,
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaBuilder {
    /// Create a builder with the built-in conversions.
    #[must_use]
    pub fn new() -> Self {
        Self::with_registry(ConversionRegistry::new())
    }

    /// Create a builder with a custom conversion registry.
    #[must_use]
    pub fn with_registry(registry: ConversionRegistry) -> Self {
        Self {
            registry,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// The conversion registry used to resolve fields.
    #[must_use]
    pub fn registry(&self) -> &ConversionRegistry {
        &self.registry
    }

    /// Number of record types with a cached schema.
    #[must_use]
    pub fn cached_len(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Schema for `R`, built on first request and cached afterwards.
    ///
    /// Failures are not cached.
    pub fn schema<R: FlatRecord>(&self) -> Result<Arc<Schema<R>>, SchemaError> {
        let type_id = TypeId::of::<R>();

        let cached = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&type_id)
            .cloned();
        if let Some(schema) = cached.and_then(|any| any.downcast::<Schema<R>>().ok()) {
            tracing::trace!(record = schema.record_name(), "schema served from cache");
            return Ok(schema);
        }

        let schema = Arc::new(self.build(R::describe())?);

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        let entry = cache
            .entry(type_id)
            .or_insert_with(|| schema.clone() as CachedSchema)
            .clone();
        Ok(entry.downcast::<Schema<R>>().unwrap_or(schema))
    }

    /// Validate a description and build its schema, bypassing the cache.
    pub fn build<R: 'static>(
        &self,
        description: RecordDescription<R>,
    ) -> Result<Schema<R>, SchemaError> {
        let (record, modes, specs) = description.into_parts();

        let mode = match modes.as_slice() {
            [] => {
                return Err(SchemaError::MissingModeMarker {
                    record: record.to_string(),
                });
            }
            [mode] => *mode,
            _ => {
                return Err(SchemaError::DuplicateModeMarker {
                    record: record.to_string(),
                    count: modes.len(),
                });
            }
        };

        if specs.is_empty() {
            return Err(SchemaError::NoFieldsDeclared {
                record: record.to_string(),
            });
        }

        if let Some(spec) = specs.iter().find(|spec| spec.layout().mode() != mode) {
            return Err(SchemaError::ModeFieldMismatch {
                record: record.to_string(),
                field: spec.name().to_string(),
                mode,
                field_mode: spec.layout().mode(),
            });
        }

        if let Some(spec) = specs.iter().find(|spec| spec.layout().length() == 0) {
            return Err(SchemaError::ZeroLengthField {
                record: record.to_string(),
                field: spec.name().to_string(),
            });
        }

        let mut names = HashSet::with_capacity(specs.len());
        if let Some(spec) = specs.iter().find(|spec| !names.insert(spec.name())) {
            return Err(SchemaError::DuplicateFieldName {
                record: record.to_string(),
                field: spec.name().to_string(),
            });
        }

        if mode == LineMode::Sequential {
            let mut orders: HashMap<u32, &'static str> = HashMap::with_capacity(specs.len());
            for spec in &specs {
                let Some(order) = spec.layout().order() else {
                    continue;
                };
                if let Some(first) = orders.insert(order, spec.name()) {
                    return Err(SchemaError::DuplicateOrder {
                        record: record.to_string(),
                        order,
                        first: first.to_string(),
                        second: spec.name().to_string(),
                    });
                }
            }
        }

        let mut fields = Vec::with_capacity(specs.len());
        for spec in specs {
            let (name, layout, conversion, binding) = spec.into_parts();
            let (access, conversion) = binding
                .resolve(&self.registry, &conversion)
                .map_err(|err| match err {
                    ResolveError::Unresolved { rule } => SchemaError::UnresolvedConversion {
                        record: record.to_string(),
                        field: name.to_string(),
                        type_name: binding.type_name(),
                        rule,
                    },
                    ResolveError::Invalid { rule, reason } => SchemaError::InvalidConversion {
                        record: record.to_string(),
                        field: name.to_string(),
                        rule,
                        reason,
                    },
                })?;

            fields.push(FieldDescriptor {
                name,
                kind: binding.kind(),
                type_name: binding.type_name(),
                layout,
                offset: layout.start().unwrap_or(0),
                conversion,
                access,
            });
        }

        if mode == LineMode::Sequential {
            fields.sort_by_key(|field| field.layout.order());
            let mut offset = 0usize;
            for field in &mut fields {
                field.offset = offset;
                offset += field.length();
            }
        }

        let mut physical: Vec<usize> = (0..fields.len()).collect();
        physical.sort_by_key(|&idx| fields[idx].offset);

        let width = fields.iter().map(FieldDescriptor::end).max().unwrap_or(0);
        let overlap = find_overlap(&fields, &physical);

        tracing::debug!(
            record,
            %mode,
            fields = fields.len(),
            width,
            "built record schema"
        );
        if let Some((first, second)) = overlap {
            tracing::debug!(
                record,
                first = fields[first].name,
                second = fields[second].name,
                "positional fields overlap; records of this type can be decoded but not encoded"
            );
        }

        Ok(Schema {
            record,
            mode,
            fields,
            physical,
            width,
            overlap,
        })
    }
}

impl std::fmt::Debug for SchemaBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaBuilder")
            .field("registry", &self.registry)
            .field("cached", &self.cached_len())
            .finish()
    }
}

/// First pair of fields (in physical order) whose ranges intersect.
fn find_overlap<R>(fields: &[FieldDescriptor<R>], physical: &[usize]) -> Option<(usize, usize)> {
    let mut furthest: Option<usize> = None;
    for &idx in physical {
        if let Some(prev) = furthest {
            if fields[idx].offset < fields[prev].end() {
                return Some((prev, idx));
            }
            if fields[idx].end() > fields[prev].end() {
                furthest = Some(idx);
            }
        } else {
            furthest = Some(idx);
        }
    }
    None
}

static DEFAULT_BUILDER: OnceLock<SchemaBuilder> = OnceLock::new();

/// Process-wide builder with the built-in conversions.
///
/// Record types that need custom conversions should use their own
/// [`SchemaBuilder::with_registry`] instead.
pub fn default_builder() -> &'static SchemaBuilder {
    DEFAULT_BUILDER.get_or_init(SchemaBuilder::new)
}
