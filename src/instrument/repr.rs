//! Textual rendering of call arguments.
//!
//! Arguments are recorded as a tuple literal: `('first',)`, `(1, 2.5)`, `()`.
//! Strings are quoted and escaped so the record reads back unambiguously.

/// A value that can render itself as a literal.
pub trait Repr {
    fn repr(&self) -> String;
}

impl<T: Repr + ?Sized> Repr for &T {
    fn repr(&self) -> String {
        (**self).repr()
    }
}

impl Repr for str {
    fn repr(&self) -> String {
        quote_text(self)
    }
}

impl Repr for String {
    fn repr(&self) -> String {
        quote_text(self)
    }
}

impl Repr for [u8] {
    fn repr(&self) -> String {
        quote_bytes(self)
    }
}

impl Repr for Vec<u8> {
    fn repr(&self) -> String {
        quote_bytes(self)
    }
}

impl Repr for f64 {
    fn repr(&self) -> String {
        float_repr(*self)
    }
}

impl Repr for bool {
    fn repr(&self) -> String {
        let text = if *self { "True" } else { "False" };
        text.to_string()
    }
}

macro_rules! int_repr {
    ($($t:ty),*) => {
        $(impl Repr for $t {
            fn repr(&self) -> String {
                self.to_string()
            }
        })*
    };
}

int_repr!(i32, i64, u32, u64, usize);

impl<T: Repr> Repr for Option<T> {
    fn repr(&self) -> String {
        match self {
            Some(value) => value.repr(),
            None => "None".to_string(),
        }
    }
}

/// Shortest representation that reads back as the same float.
pub fn float_repr(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value.is_infinite() {
        let text = if value > 0.0 { "inf" } else { "-inf" };
        text.to_string()
    } else {
        format!("{:?}", value)
    }
}

fn pick_quote(has_single: bool, has_double: bool) -> char {
    if has_single && !has_double {
        '"'
    } else {
        '\''
    }
}

fn quote_text(text: &str) -> String {
    let quote = pick_quote(text.contains('\''), text.contains('"'));
    let mut out = String::with_capacity(text.len() + 2);
    out.push(quote);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => {
                let code = c as u32;
                if code <= 0xff {
                    out.push_str(&format!("\\x{:02x}", code));
                } else {
                    out.push_str(&format!("\\u{:04x}", code));
                }
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

fn quote_bytes(bytes: &[u8]) -> String {
    let quote = pick_quote(bytes.contains(&b'\''), bytes.contains(&b'"'));
    let mut out = String::with_capacity(bytes.len() + 3);
    out.push('b');
    out.push(quote);
    for &b in bytes {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            b if b as char == quote => {
                out.push('\\');
                out.push(quote);
            }
            0x20..=0x7e => out.push(b as char),
            b => out.push_str(&format!("\\x{:02x}", b)),
        }
    }
    out.push(quote);
    out
}

// == Call Args ==
/// An argument list that can be recorded in a call log.
pub trait CallArgs {
    fn render(&self) -> String;
}

impl CallArgs for () {
    fn render(&self) -> String {
        "()".to_string()
    }
}

impl<A: Repr> CallArgs for (A,) {
    fn render(&self) -> String {
        format!("({},)", self.0.repr())
    }
}

macro_rules! tuple_args {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: Repr),+> CallArgs for ($($name,)+) {
            fn render(&self) -> String {
                let parts = [$(self.$idx.repr()),+];
                format!("({})", parts.join(", "))
            }
        }
    };
}

tuple_args!(A: 0, B: 1);
tuple_args!(A: 0, B: 1, C: 2);
tuple_args!(A: 0, B: 1, C: 2, D: 3);
