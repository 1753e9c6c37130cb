// Sun Oct 18 2026 - Alex

/// Turns a mangled symbol into a readable name. `None` means the input was
/// not accepted.
pub trait Demangler: Send + Sync {
    fn demangle(&self, mangled: &[u8]) -> Option<String>;
}

/// Demangler for the subset of the Swift 5 mangling used by type metadata
/// and simple declarations. Anything outside that subset is rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwiftDemangler;

impl Demangler for SwiftDemangler {
    fn demangle(&self, mangled: &[u8]) -> Option<String> {
        demangle_symbol(std::str::from_utf8(mangled).ok()?)
    }
}

const SYMBOL_PREFIXES: [&str; 4] = ["$s", "$S", "$e", "_T0"];
const MAX_REPEAT: usize = 64;

/// Mangling body of a Swift symbol, without the optional Mach-O underscore
/// and the mangling prefix.
pub fn strip_prefix(name: &str) -> Option<&str> {
    let unprefixed = name.strip_prefix('_').unwrap_or(name);
    SYMBOL_PREFIXES
        .iter()
        .find_map(|prefix| unprefixed.strip_prefix(prefix))
        .or_else(|| SYMBOL_PREFIXES.iter().find_map(|prefix| name.strip_prefix(prefix)))
}

pub fn is_mangled(name: &str) -> bool {
    strip_prefix(name).is_some()
}

pub fn demangle_symbol(name: &str) -> Option<String> {
    let body = strip_prefix(name)?;
    let node = SwiftParser::new(body.as_bytes()).parse()?;
    match node {
        Node::Entity(text) => Some(text),
        other => other.type_name(),
    }
}

/// Demangles a bare type mangling as found in field records, e.g. `Si`.
pub fn demangle_type(mangled: &str) -> Option<String> {
    SwiftParser::new(mangled.as_bytes()).parse()?.type_name()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Identifier(String),
    Module(String),
    Nominal(String),
    Type(String),
    Tuple(Vec<String>),
    EmptyList,
    FirstElementMarker,
    Entity(String),
}

impl Node {
    fn type_name(&self) -> Option<String> {
        match self {
            Self::Nominal(name) | Self::Type(name) => Some(name.clone()),
            Self::Tuple(elements) => Some(format!("({})", elements.join(", "))),
            _ => None,
        }
    }

    fn context_name(&self) -> Option<String> {
        match self {
            Self::Identifier(name) | Self::Module(name) | Self::Nominal(name) => Some(name.clone()),
            _ => None,
        }
    }
}

struct SwiftParser<'a> {
    input: &'a [u8],
    pos: usize,
    stack: Vec<Node>,
    substitutions: Vec<Node>,
}

impl<'a> SwiftParser<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            stack: Vec::new(),
            substitutions: Vec::new(),
        }
    }

    fn parse(mut self) -> Option<Node> {
        while let Some(c) = self.next() {
            match c {
                b'1'..=b'9' => {
                    self.pos -= 1;
                    let ident = Node::Identifier(self.parse_identifier()?);
                    self.substitutions.push(ident.clone());
                    self.stack.push(ident);
                }
                // word substitutions
                b'0' => return None,
                b's' => self.stack.push(Node::Module("Swift".to_string())),
                b'S' => self.parse_standard()?,
                b'A' => self.parse_substitution()?,
                b'C' | b'V' | b'O' | b'P' => {
                    let name = self.pop_identifier()?;
                    let context = self.pop()?.context_name()?;
                    let nominal = Node::Nominal(format!("{}.{}", context, name));
                    self.substitutions.push(nominal.clone());
                    self.stack.push(nominal);
                }
                b'y' => self.stack.push(Node::EmptyList),
                b'_' => self.stack.push(Node::FirstElementMarker),
                b't' => self.parse_tuple()?,
                b'G' => self.parse_bound_generic()?,
                b'F' => self.parse_function()?,
                b'v' => self.parse_variable()?,
                b'N' => {
                    let ty = self.pop_type()?;
                    self.stack.push(Node::Entity(format!("type metadata for {}", ty)));
                }
                b'M' => self.parse_metadata()?,
                _ => return None,
            }
        }

        match self.stack.len() {
            1 => self.stack.pop(),
            _ => None,
        }
    }

    fn next(&mut self) -> Option<u8> {
        let c = *self.input.get(self.pos)?;
        self.pos += 1;
        Some(c)
    }

    fn pop(&mut self) -> Option<Node> {
        self.stack.pop()
    }

    fn pop_identifier(&mut self) -> Option<String> {
        match self.pop()? {
            Node::Identifier(name) => Some(name),
            _ => None,
        }
    }

    fn pop_type(&mut self) -> Option<String> {
        self.pop()?.type_name()
    }

    /// Protocols in entity manglings carry no `P` suffix: a bare identifier
    /// over its context, or an already resolved nominal.
    fn pop_protocol(&mut self) -> Option<String> {
        match self.pop()? {
            Node::Identifier(name) => {
                let context = self.pop()?.context_name()?;
                Some(format!("{}.{}", context, name))
            }
            Node::Nominal(name) => Some(name),
            _ => None,
        }
    }

    fn parse_natural(&mut self) -> Option<usize> {
        let start = self.pos;
        while matches!(self.input.get(self.pos), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }
        if start == self.pos {
            return None;
        }
        std::str::from_utf8(&self.input[start..self.pos]).ok()?.parse().ok()
    }

    fn parse_repeat(&mut self) -> Option<usize> {
        if !matches!(self.input.get(self.pos), Some(c) if c.is_ascii_digit()) {
            return Some(1);
        }
        self.parse_natural().filter(|&n| n <= MAX_REPEAT)
    }

    fn parse_identifier(&mut self) -> Option<String> {
        let len = self.parse_natural()?;
        let end = self.pos.checked_add(len)?;
        let text = std::str::from_utf8(self.input.get(self.pos..end)?).ok()?;
        self.pos = end;
        Some(text.to_string())
    }

    fn parse_standard(&mut self) -> Option<()> {
        let repeat = self.parse_repeat()?;
        let c = self.next()?;
        let node = match c {
            b'i' => Node::Nominal("Swift.Int".to_string()),
            b'b' => Node::Nominal("Swift.Bool".to_string()),
            b'S' => Node::Nominal("Swift.String".to_string()),
            b'd' => Node::Nominal("Swift.Double".to_string()),
            b'f' => Node::Nominal("Swift.Float".to_string()),
            b'u' => Node::Nominal("Swift.UInt".to_string()),
            b'a' => Node::Nominal("Swift.Array".to_string()),
            b'D' => Node::Nominal("Swift.Dictionary".to_string()),
            b'h' => Node::Nominal("Swift.Set".to_string()),
            b'q' => Node::Nominal("Swift.Optional".to_string()),
            b'H' => Node::Nominal("Swift.Hashable".to_string()),
            b'Q' => Node::Nominal("Swift.Equatable".to_string()),
            b'L' => Node::Nominal("Swift.Comparable".to_string()),
            b'E' => Node::Nominal("Swift.Encodable".to_string()),
            b'e' => Node::Nominal("Swift.Decodable".to_string()),
            b'o' => Node::Module("__C".to_string()),
            b'g' => {
                let wrapped = self.pop_type()?;
                Node::Type(format!("{}?", wrapped))
            }
            _ => return None,
        };
        for _ in 0..repeat {
            self.stack.push(node.clone());
        }
        Some(())
    }

    /// `A` followed by lowercase letters that each push one substitution and
    /// a final uppercase letter; letters may carry a repeat count.
    fn parse_substitution(&mut self) -> Option<()> {
        loop {
            let repeat = self.parse_repeat()?;
            let c = self.next()?;
            let (index, last) = match c {
                b'a'..=b'z' => ((c - b'a') as usize, false),
                b'A'..=b'Z' => ((c - b'A') as usize, true),
                _ => return None,
            };
            let node = self.substitutions.get(index)?.clone();
            for _ in 0..repeat {
                self.stack.push(node.clone());
            }
            if last {
                return Some(());
            }
        }
    }

    fn parse_tuple(&mut self) -> Option<()> {
        if self.stack.last() == Some(&Node::EmptyList) {
            self.pop();
            self.stack.push(Node::Tuple(Vec::new()));
            return Some(());
        }
        let mut elements = Vec::new();
        loop {
            let first = self.stack.last() == Some(&Node::FirstElementMarker);
            if first {
                self.pop();
            }
            elements.push(self.pop_type()?);
            if first {
                break;
            }
        }
        elements.reverse();
        self.stack.push(Node::Tuple(elements));
        Some(())
    }

    fn parse_bound_generic(&mut self) -> Option<()> {
        let mut args = Vec::new();
        loop {
            match self.pop()? {
                Node::EmptyList => break,
                node => args.push(node.type_name()?),
            }
        }
        args.reverse();
        let base = self.pop_type()?;
        let rendered = match (base.as_str(), args.as_slice()) {
            ("Swift.Array", [element]) => format!("[{}]", element),
            ("Swift.Dictionary", [key, value]) => format!("[{} : {}]", key, value),
            ("Swift.Optional", [wrapped]) => format!("{}?", wrapped),
            _ => format!("{}<{}>", base, args.join(", ")),
        };
        self.stack.push(Node::Type(rendered));
        Some(())
    }

    fn pop_params(&mut self) -> Option<String> {
        match self.pop()? {
            Node::EmptyList => Some("()".to_string()),
            Node::Tuple(elements) => Some(format!("({})", elements.join(", "))),
            node => Some(format!("({})", node.type_name()?)),
        }
    }

    fn pop_result(&mut self) -> Option<String> {
        match self.pop()? {
            Node::EmptyList => Some("()".to_string()),
            node => node.type_name(),
        }
    }

    fn parse_function(&mut self) -> Option<()> {
        let params = self.pop_params()?;
        let result = self.pop_result()?;
        let name = self.pop_identifier()?;
        let context = self.pop()?.context_name()?;
        self.stack.push(Node::Entity(format!("{}.{}{} -> {}", context, name, params, result)));
        Some(())
    }

    fn parse_variable(&mut self) -> Option<()> {
        let ty = self.pop_type()?;
        let name = self.pop_identifier()?;
        let context = self.pop()?.context_name()?;
        let accessor = match self.next()? {
            b'g' => ".getter",
            b's' => ".setter",
            b'M' => ".modify",
            b'p' => "",
            _ => return None,
        };
        self.stack.push(Node::Entity(format!("{}.{}{} : {}", context, name, accessor, ty)));
        Some(())
    }

    fn parse_metadata(&mut self) -> Option<()> {
        let c = self.next()?;
        if c == b'c' {
            let module = self.pop()?.context_name()?;
            let protocol = self.pop_protocol()?;
            let ty = self.pop_type()?;
            self.stack.push(Node::Entity(format!(
                "protocol conformance descriptor for {} : {} in {}",
                ty, protocol, module
            )));
            return Some(());
        }

        if c == b'p' {
            let protocol = self.pop_protocol()?;
            self.stack.push(Node::Entity(format!("protocol descriptor for {}", protocol)));
            return Some(());
        }

        let prefix = match c {
            b'a' => "type metadata accessor for",
            b'n' => "nominal type descriptor for",
            b'f' => "full type metadata for",
            b'F' => "reflection metadata field descriptor",
            b'm' => "metaclass for",
            _ => return None,
        };
        let ty = self.pop_type()?;
        self.stack.push(Node::Entity(format!("{} {}", prefix, ty)));
        Some(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_symbols() {
        assert_eq!(
            demangle_symbol("$s3App3FooCMn").as_deref(),
            Some("nominal type descriptor for App.Foo")
        );
        assert_eq!(demangle_symbol("$s3App3BarVN").as_deref(), Some("type metadata for App.Bar"));
        assert_eq!(demangle_symbol("_$s3App1PMp").as_deref(), Some("protocol descriptor for App.P"));
        assert_eq!(
            demangle_symbol("$s3App3FooCMa").as_deref(),
            Some("type metadata accessor for App.Foo")
        );
        assert_eq!(demangle_symbol("$sSiN").as_deref(), Some("type metadata for Swift.Int"));
        assert_eq!(
            demangle_symbol("$s7SwiftUI4ViewMp").as_deref(),
            Some("protocol descriptor for SwiftUI.View")
        );
    }

    #[test]
    fn test_functions_and_accessors() {
        assert_eq!(demangle_symbol("$s4main3fooyyF").as_deref(), Some("main.foo() -> ()"));
        assert_eq!(demangle_symbol("$s4main3addS2i_SitF").as_deref(), Some("main.add(Swift.Int, Swift.Int) -> Swift.Int"));
        assert_eq!(
            demangle_symbol("$s4main3FooC5countSivg").as_deref(),
            Some("main.Foo.count.getter : Swift.Int")
        );
        assert_eq!(demangle_symbol("$s4main5titleSSvs").as_deref(), Some("main.title.setter : Swift.String"));
    }

    #[test]
    fn test_substitutions() {
        assert_eq!(
            demangle_symbol("$s4main3FooVAA1PAAMc").as_deref(),
            Some("protocol conformance descriptor for main.Foo : main.P in main")
        );
        assert_eq!(
            demangle_symbol("$s3App3FooVSHAAMc").as_deref(),
            Some("protocol conformance descriptor for App.Foo : Swift.Hashable in App")
        );
        assert_eq!(demangle_symbol("$s4main3FooVABN").as_deref(), None);
        assert_eq!(demangle_symbol("$s4main3FooVAA1PMc"), None);
        assert_eq!(
            demangle_symbol("$s4main3FooV3BarOMn").as_deref(),
            Some("nominal type descriptor for main.Foo.Bar")
        );
    }

    #[test]
    fn test_type_manglings() {
        assert_eq!(demangle_type("Si").as_deref(), Some("Swift.Int"));
        assert_eq!(demangle_type("SiSg").as_deref(), Some("Swift.Int?"));
        assert_eq!(demangle_type("SaySSG").as_deref(), Some("[Swift.String]"));
        assert_eq!(demangle_type("SDySSSiG").as_deref(), Some("[Swift.String : Swift.Int]"));
        assert_eq!(demangle_type("So8NSObjectC").as_deref(), Some("__C.NSObject"));
        assert_eq!(demangle_type("3App3FooV").as_deref(), Some("App.Foo"));
        assert_eq!(demangle_type("3Foo"), None);
    }

    #[test]
    fn test_rejections() {
        assert_eq!(demangle_symbol("_main"), None);
        assert_eq!(demangle_symbol("$s4main03fooB0yyF"), None);
        assert_eq!(demangle_symbol("$s4main3fooyyFZZ"), None);
        assert_eq!(demangle_symbol("$s4ma"), None);
        assert_eq!(SwiftDemangler.demangle(&[0x24, 0x73, 0xff]), None);
        assert_eq!(demangle_symbol("_objc_msgSend"), None);
    }

    #[test]
    fn test_prefixes() {
        assert!(is_mangled("$s3App3FooCMn"));
        assert!(is_mangled("_$s3App3FooCMn"));
        assert!(is_mangled("$S3App3FooCMn"));
        assert!(is_mangled("_T03App3FooCMn"));
        assert!(is_mangled("__T03App3FooCMn"));
        assert!(!is_mangled("_main"));
    }
}
