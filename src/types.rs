/// Canonical type descriptors shared by every front-end and back-end
///
/// A `TypeRef` is an immutable value: a base name, a category and a
/// recursive list of type arguments. Front-ends produce them from source type
/// text through the source alias tables; back-ends render them through the
/// target type rules.
use serde::Serialize;
use std::fmt;

/// Broad classification driving which mapping rule renders a type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeCategory {
    /// bool, char, sized integers, floats, string, void
    Primitive,
    /// list, set, map, tuple
    Collection,
    /// Exactly one argument: the wrapped type
    Optional,
    /// Two or more alternatives
    Union,
    /// Parameter types followed by the return type
    Callable,
    /// User-defined or unrecognised named type
    Custom,
    /// Duck-typed or unannotated value; never guessed into something narrower
    Dynamic,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TypeRef {
    pub base_name: String,
    pub category: TypeCategory,
    pub args: Vec<TypeRef>,
}

/// Canonical primitive names
pub const PRIMITIVES: &[&str] = &[
    "bool", "char", "int8", "int16", "int32", "int64", "uint8", "uint16", "uint32", "uint64",
    "float32", "float64", "string", "void",
];

impl TypeRef {
    pub fn new(base_name: impl Into<String>, category: TypeCategory, args: Vec<TypeRef>) -> Self {
        Self {
            base_name: base_name.into(),
            category,
            args,
        }
    }

    pub fn primitive(name: &str) -> Self {
        Self::new(name, TypeCategory::Primitive, vec![])
    }

    pub fn bool() -> Self {
        Self::primitive("bool")
    }

    pub fn int32() -> Self {
        Self::primitive("int32")
    }

    pub fn int64() -> Self {
        Self::primitive("int64")
    }

    pub fn float64() -> Self {
        Self::primitive("float64")
    }

    pub fn string() -> Self {
        Self::primitive("string")
    }

    pub fn void() -> Self {
        Self::primitive("void")
    }

    pub fn dynamic() -> Self {
        Self::new("dynamic", TypeCategory::Dynamic, vec![])
    }

    pub fn custom(name: impl Into<String>, args: Vec<TypeRef>) -> Self {
        Self::new(name, TypeCategory::Custom, args)
    }

    pub fn list(element: TypeRef) -> Self {
        Self::new("list", TypeCategory::Collection, vec![element])
    }

    pub fn set(element: TypeRef) -> Self {
        Self::new("set", TypeCategory::Collection, vec![element])
    }

    pub fn map(key: TypeRef, value: TypeRef) -> Self {
        Self::new("map", TypeCategory::Collection, vec![key, value])
    }

    pub fn tuple(items: Vec<TypeRef>) -> Self {
        Self::new("tuple", TypeCategory::Collection, items)
    }

    /// Wrap in an optional; optionals never nest directly
    pub fn optional(inner: TypeRef) -> Self {
        if inner.category == TypeCategory::Optional {
            return inner;
        }
        Self::new("optional", TypeCategory::Optional, vec![inner])
    }

    /// Build a union, flattening nested unions and folding a `void`/null
    /// member into an optional wrapper
    pub fn union(members: Vec<TypeRef>) -> Self {
        let mut flat = Vec::new();
        let mut nullable = false;
        for member in members {
            match member.category {
                TypeCategory::Union => flat.extend(member.args),
                TypeCategory::Primitive if member.base_name == "void" => nullable = true,
                _ => flat.push(member),
            }
        }

        let inner = match flat.len() {
            0 => Self::void(),
            1 => flat.remove(0),
            _ => Self::new("union", TypeCategory::Union, flat),
        };

        if nullable && !inner.is_void() {
            Self::optional(inner)
        } else {
            inner
        }
    }

    pub fn callable(params: Vec<TypeRef>, ret: TypeRef) -> Self {
        let mut args = params;
        args.push(ret);
        Self::new("fn", TypeCategory::Callable, args)
    }

    pub fn is_void(&self) -> bool {
        self.category == TypeCategory::Primitive && self.base_name == "void"
    }

    pub fn is_dynamic(&self) -> bool {
        self.category == TypeCategory::Dynamic
    }

    /// The wrapped type of an optional
    pub fn inner(&self) -> Option<&TypeRef> {
        match self.category {
            TypeCategory::Optional => self.args.first(),
            _ => None,
        }
    }

    /// Parameter types and return type of a callable
    pub fn callable_parts(&self) -> Option<(&[TypeRef], &TypeRef)> {
        if self.category != TypeCategory::Callable {
            return None;
        }
        self.args.split_last().map(|(ret, params)| (params, ret))
    }

    /// Integer and floating primitives
    pub fn is_numeric(&self) -> bool {
        self.category == TypeCategory::Primitive
            && (self.base_name.starts_with("int")
                || self.base_name.starts_with("uint")
                || self.base_name.starts_with("float"))
    }
}

/// Canonical notation, e.g. `optional<list<string>>`
impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base_name)?;
        if !self.args.is_empty() {
            f.write_str("<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", arg)?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_nested() {
        let ty = TypeRef::optional(TypeRef::list(TypeRef::string()));
        assert_eq!(ty.to_string(), "optional<list<string>>");
    }

    #[test]
    fn test_union_with_null_becomes_optional() {
        let ty = TypeRef::union(vec![TypeRef::string(), TypeRef::void()]);
        assert_eq!(ty.category, TypeCategory::Optional);
        assert_eq!(ty.inner(), Some(&TypeRef::string()));
    }

    #[test]
    fn test_union_flattens() {
        let inner = TypeRef::union(vec![TypeRef::int64(), TypeRef::string()]);
        let ty = TypeRef::union(vec![inner, TypeRef::bool()]);
        assert_eq!(ty.category, TypeCategory::Union);
        assert_eq!(ty.args.len(), 3);
    }

    #[test]
    fn test_optional_does_not_nest() {
        let ty = TypeRef::optional(TypeRef::optional(TypeRef::int32()));
        assert_eq!(ty.to_string(), "optional<int32>");
    }

    #[test]
    fn test_callable_parts() {
        let ty = TypeRef::callable(vec![TypeRef::int32(), TypeRef::int32()], TypeRef::bool());
        let (params, ret) = ty.callable_parts().expect("callable");
        assert_eq!(params.len(), 2);
        assert_eq!(ret, &TypeRef::bool());
    }
}
