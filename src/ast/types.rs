use std::fmt;

/// Type category of a resolved Solidity type, derived from the `typeString`
/// that solc's type checker attaches to every expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Bool,
    /// Compile-time number literal (`int_const 5`, `rational_const 1 / 2`).
    RationalNumber,
    Integer { signed: bool, bits: u16 },
    StringLiteral,
    String,
    Address,
    FixedBytes(u8),
    Contract,
    Other,
}

impl Category {
    pub fn from_type_string(type_string: &str) -> Self {
        let ty = type_string.trim();
        if ty == "bool" {
            return Category::Bool;
        }
        if ty.starts_with("int_const") || ty.starts_with("rational_const") {
            return Category::RationalNumber;
        }
        if ty.starts_with("literal_string") {
            return Category::StringLiteral;
        }
        if ty == "string" || ty.starts_with("string ") {
            return Category::String;
        }
        if ty == "address" || ty.starts_with("address ") {
            return Category::Address;
        }
        if ty.starts_with("contract ") {
            return Category::Contract;
        }

        let head = ty.split_whitespace().next().unwrap_or("");
        if let Some(category) = parse_integer(head) {
            return category;
        }
        if let Some(width) = head
            .strip_prefix("bytes")
            .and_then(|n| n.parse::<u8>().ok())
            .filter(|n| (1..=32).contains(n))
        {
            return Category::FixedBytes(width);
        }
        Category::Other
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Category::RationalNumber | Category::Integer { .. })
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Category::StringLiteral | Category::String)
    }
}

fn parse_integer(head: &str) -> Option<Category> {
    let (signed, digits) = if let Some(rest) = head.strip_prefix("uint") {
        (false, rest)
    } else if let Some(rest) = head.strip_prefix("int") {
        (true, rest)
    } else {
        return None;
    };
    let bits = if digits.is_empty() {
        256
    } else {
        digits.parse::<u16>().ok()?
    };
    if bits == 0 || bits > 256 || bits % 8 != 0 {
        return None;
    }
    Some(Category::Integer { signed, bits })
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Bool => write!(f, "bool"),
            Category::RationalNumber => write!(f, "rational"),
            Category::Integer { signed: true, bits } => write!(f, "int{}", bits),
            Category::Integer { signed: false, bits } => write!(f, "uint{}", bits),
            Category::StringLiteral => write!(f, "literal_string"),
            Category::String => write!(f, "string"),
            Category::Address => write!(f, "address"),
            Category::FixedBytes(n) => write!(f, "bytes{}", n),
            Category::Contract => write!(f, "contract"),
            Category::Other => write!(f, "other"),
        }
    }
}
