//! Scalar type representation for semantic analysis

use std::fmt;

/// The base scalar kinds of the language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseKind {
    Integer,
    Double,
    Char,
    Str,
}

impl BaseKind {
    /// The plain data type of this base
    pub fn plain(self) -> DataType {
        match self {
            BaseKind::Integer => DataType::Integer,
            BaseKind::Double => DataType::Double,
            BaseKind::Char => DataType::Char,
            BaseKind::Str => DataType::Str,
        }
    }

    /// The named-variable variant of this base
    pub fn var(self) -> DataType {
        match self {
            BaseKind::Integer => DataType::VarInteger,
            BaseKind::Double => DataType::VarDouble,
            BaseKind::Char => DataType::VarChar,
            BaseKind::Str => DataType::VarStr,
        }
    }

    /// The by-ref variant of this base
    pub fn by_ref(self) -> DataType {
        match self {
            BaseKind::Integer => DataType::RefInteger,
            BaseKind::Double => DataType::RefDouble,
            BaseKind::Char => DataType::RefChar,
            BaseKind::Str => DataType::RefStr,
        }
    }
}

/// A scalar data type
///
/// The plain kinds describe literal values; `Var*` marks a named variable of
/// the base kind and `Ref*` a by-ref parameter. `Unknown`/`RefUnknown` are
/// parser placeholders for call arguments whose type the analyzer resolves.
/// `Nil` is the declared return type of a function returning no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Integer,
    Double,
    Char,
    Str,

    VarInteger,
    VarDouble,
    VarChar,
    VarStr,

    RefInteger,
    RefDouble,
    RefChar,
    RefStr,

    Unknown,
    RefUnknown,
    Nil,
    Undefined,
}

impl DataType {
    /// The base scalar kind, collapsing `Var`/`Ref`/plain prefixes
    pub fn base(&self) -> Option<BaseKind> {
        match self {
            DataType::Integer | DataType::VarInteger | DataType::RefInteger => {
                Some(BaseKind::Integer)
            }
            DataType::Double | DataType::VarDouble | DataType::RefDouble => Some(BaseKind::Double),
            DataType::Char | DataType::VarChar | DataType::RefChar => Some(BaseKind::Char),
            DataType::Str | DataType::VarStr | DataType::RefStr => Some(BaseKind::Str),
            DataType::Unknown | DataType::RefUnknown | DataType::Nil | DataType::Undefined => None,
        }
    }

    /// Check if this is a by-ref type
    pub fn is_ref(&self) -> bool {
        matches!(
            self,
            DataType::RefInteger
                | DataType::RefDouble
                | DataType::RefChar
                | DataType::RefStr
                | DataType::RefUnknown
        )
    }

    /// Check if this is a named-variable type
    pub fn is_var(&self) -> bool {
        matches!(
            self,
            DataType::VarInteger | DataType::VarDouble | DataType::VarChar | DataType::VarStr
        )
    }

    /// Check if this is a placeholder awaiting resolution
    pub fn is_unresolved(&self) -> bool {
        matches!(self, DataType::Unknown | DataType::RefUnknown)
    }
}

/// The sole type-compatibility test for call arguments: two types match iff
/// they denote the same base scalar, regardless of `Var`/`Ref`/plain prefix.
pub fn base_equal(a: DataType, b: DataType) -> bool {
    match (a.base(), b.base()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DataType::Integer => "int",
            DataType::Double => "double",
            DataType::Char => "char",
            DataType::Str => "string",
            DataType::VarInteger => "var int",
            DataType::VarDouble => "var double",
            DataType::VarChar => "var char",
            DataType::VarStr => "var string",
            DataType::RefInteger => "ref int",
            DataType::RefDouble => "ref double",
            DataType::RefChar => "ref char",
            DataType::RefStr => "ref string",
            DataType::Unknown => "unknown",
            DataType::RefUnknown => "ref unknown",
            DataType::Nil => "nil",
            DataType::Undefined => "undefined",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_TYPED: [DataType; 12] = [
        DataType::Integer,
        DataType::Double,
        DataType::Char,
        DataType::Str,
        DataType::VarInteger,
        DataType::VarDouble,
        DataType::VarChar,
        DataType::VarStr,
        DataType::RefInteger,
        DataType::RefDouble,
        DataType::RefChar,
        DataType::RefStr,
    ];

    #[test]
    fn test_base_equal_reflexive() {
        for ty in ALL_TYPED {
            assert!(base_equal(ty, ty), "{} should base-equal itself", ty);
        }
    }

    #[test]
    fn test_base_equal_symmetric() {
        for a in ALL_TYPED {
            for b in ALL_TYPED {
                assert_eq!(base_equal(a, b), base_equal(b, a));
            }
        }
    }

    #[test]
    fn test_base_equal_collapses_prefixes() {
        assert!(base_equal(DataType::Integer, DataType::VarInteger));
        assert!(base_equal(DataType::Integer, DataType::RefInteger));
        assert!(base_equal(DataType::VarStr, DataType::RefStr));
        assert!(!base_equal(DataType::Integer, DataType::Double));
        assert!(!base_equal(DataType::VarChar, DataType::RefStr));
    }

    #[test]
    fn test_sentinels_never_base_equal() {
        for ty in [
            DataType::Unknown,
            DataType::RefUnknown,
            DataType::Nil,
            DataType::Undefined,
        ] {
            assert!(!base_equal(ty, ty));
            assert!(!base_equal(ty, DataType::Integer));
        }
    }

    #[test]
    fn test_promotion_round_trip() {
        assert_eq!(BaseKind::Integer.var(), DataType::VarInteger);
        assert_eq!(BaseKind::Double.by_ref(), DataType::RefDouble);
        assert_eq!(DataType::VarChar.base(), Some(BaseKind::Char));
        assert_eq!(DataType::RefStr.base(), Some(BaseKind::Str));
    }
}
