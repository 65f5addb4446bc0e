//! The `str` class.
//!
//! Text exists in two forms: primitive [`Value::Text`] and instances of `str` (or a
//! subclass) carrying the text as payload. Methods accept either form as receiver and
//! return primitive text.

use std::rc::Rc;

use super::{
    Payload,
    list::list_items,
    slice::{SeqIndex, normalize_index},
    tuple::tuple_items,
};
use crate::{
    ExcType, Runtime,
    exception_private::RunResult,
    function::{Signature, unpack},
    namespace::Namespace,
    value::Value,
};

/// The text behind a primitive string or a `str` instance.
pub(crate) fn text_of(value: &Value) -> Option<Rc<str>> {
    match value {
        Value::Text(text) => Some(text.clone()),
        Value::Instance(inst) => match &*inst.payload() {
            Payload::Str(text) => Some(text.clone()),
            _ => None,
        },
        _ => None,
    }
}

fn this_text(this: &Value) -> RunResult<Rc<str>> {
    text_of(this).ok_or_else(|| ExcType::type_error("descriptor requires a 'str' object"))
}

fn text_arg(value: &Value, method: &str) -> RunResult<Rc<str>> {
    text_of(value).ok_or_else(|| ExcType::type_error(format!("{method}() argument must be str")))
}

/// Char offset of a byte offset.
fn char_offset(text: &str, byte: usize) -> usize {
    text[..byte].chars().count()
}

fn str_init(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, item] = unpack(args)?;
    let text = rt.str_of(&item)?;
    match this.as_instance() {
        Some(inst) => inst.set_payload(Payload::Str(text)),
        None => return Err(ExcType::type_error("descriptor requires a 'str' object")),
    }
    Ok(Value::None)
}

fn str_str(_rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this] = unpack(args)?;
    Ok(Value::Text(this_text(&this)?))
}

fn str_repr(_rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this] = unpack(args)?;
    Ok(Value::from(quote(&this_text(&this)?)))
}

/// Quotes text the way the language's `repr` does.
pub(crate) fn quote(text: &str) -> String {
    let delim = if text.contains('\'') && !text.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(text.len() + 2);
    out.push(delim);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == delim => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(delim);
    out
}

fn str_len(_rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this] = unpack(args)?;
    Ok(Value::Int(this_text(&this)?.chars().count() as i64))
}

fn str_iter(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this] = unpack(args)?;
    let chars = chars_of(&this_text(&this)?);
    let list = rt.new_list(chars)?;
    rt.iter(&list)
}

fn chars_of(text: &str) -> Vec<Value> {
    text.chars().map(|c| Value::from(c.to_string())).collect()
}

fn str_add(_rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, other] = unpack(args)?;
    let Some(other) = text_of(&other) else {
        return Ok(Value::NotImplemented);
    };
    Ok(Value::from(format!("{}{other}", this_text(&this)?)))
}

fn str_radd(_rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, other] = unpack(args)?;
    let Some(other) = text_of(&other) else {
        return Ok(Value::NotImplemented);
    };
    Ok(Value::from(format!("{other}{}", this_text(&this)?)))
}

fn str_mul(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, times] = unpack(args)?;
    let Some(times) = times.as_int() else {
        return Ok(Value::NotImplemented);
    };
    let text = this_text(&this)?;
    let times = usize::try_from(times).unwrap_or(0);
    if text.is_empty() || times == 0 {
        return Ok(Value::from(""));
    }
    let len = text
        .len()
        .checked_mul(times)
        .filter(|len| isize::try_from(*len).is_ok())
        .ok_or_else(|| ExcType::overflow("repeated string is too long"))?;
    rt.check_large_result(len)?;
    let mut out = String::new();
    out.try_reserve_exact(len).map_err(|_| ExcType::memory_error())?;
    for _ in 0..times {
        out.push_str(&text);
    }
    Ok(Value::from(out))
}

fn str_contains(_rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, item] = unpack(args)?;
    let needle = text_of(&item).ok_or_else(|| ExcType::type_error("'in <string>' requires string as left operand"))?;
    Ok(Value::Bool(this_text(&this)?.contains(&*needle)))
}

/// Comparison methods: `NotImplemented` for non-text operands.
fn text_compare(args: Vec<Value>, test: fn(&str, &str) -> bool) -> RunResult<Value> {
    let [this, other] = unpack(args)?;
    let Some(other) = text_of(&other) else {
        return Ok(Value::NotImplemented);
    };
    Ok(Value::Bool(test(&this_text(&this)?, &other)))
}

fn str_getitem(_rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, index] = unpack(args)?;
    let text = this_text(&this)?;
    let chars: Vec<char> = text.chars().collect();
    match SeqIndex::from_value(&index, "string")? {
        SeqIndex::Int(i) => normalize_index(i, chars.len())
            .map(|i| Value::from(chars[i].to_string()))
            .ok_or_else(|| ExcType::index_error("string index out of range")),
        SeqIndex::Slice(slice) => Ok(Value::from(slice.select(&chars)?.into_iter().collect::<String>())),
    }
}

fn str_capitalize(_rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this] = unpack(args)?;
    let text = this_text(&this)?;
    let mut chars = text.chars();
    let out: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
        None => String::new(),
    };
    Ok(Value::from(out))
}

fn str_lower(_rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this] = unpack(args)?;
    Ok(Value::from(this_text(&this)?.to_lowercase()))
}

fn str_upper(_rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this] = unpack(args)?;
    Ok(Value::from(this_text(&this)?.to_uppercase()))
}

fn str_title(_rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this] = unpack(args)?;
    let mut out = String::new();
    let mut in_word = false;
    for c in this_text(&this)?.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    Ok(Value::from(out))
}

#[derive(Clone, Copy)]
enum Strip {
    Both,
    Left,
    Right,
}

fn strip(args: Vec<Value>, side: Strip) -> RunResult<Value> {
    let [this, chars] = unpack(args)?;
    let text = this_text(&this)?;
    let set = if chars.is_none() {
        None
    } else {
        Some(text_arg(&chars, "strip")?)
    };
    let matches = |c: char| match &set {
        Some(set) => set.contains(c),
        None => c.is_whitespace(),
    };
    let out = match side {
        Strip::Both => text.trim_matches(matches),
        Strip::Left => text.trim_start_matches(matches),
        Strip::Right => text.trim_end_matches(matches),
    };
    Ok(Value::from(out))
}

/// The candidates of `startswith`/`endswith`: one string or a tuple/list of strings.
fn affixes(value: &Value, method: &str) -> RunResult<Vec<Rc<str>>> {
    if let Some(text) = text_of(value) {
        return Ok(vec![text]);
    }
    let items = tuple_items(value)
        .map(|items| items.to_vec())
        .or_else(|| list_items(value))
        .ok_or_else(|| ExcType::type_error(format!("{method} first arg must be str or a tuple of str")))?;
    items.iter().map(|item| text_arg(item, method)).collect()
}

fn str_startswith(_rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, prefix] = unpack(args)?;
    let text = this_text(&this)?;
    let found = affixes(&prefix, "startswith")?.iter().any(|p| text.starts_with(&**p));
    Ok(Value::Bool(found))
}

fn str_endswith(_rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, suffix] = unpack(args)?;
    let text = this_text(&this)?;
    let found = affixes(&suffix, "endswith")?.iter().any(|s| text.ends_with(&**s));
    Ok(Value::Bool(found))
}

fn find_in(args: Vec<Value>, method: &str) -> RunResult<Option<usize>> {
    let [this, sub] = unpack(args)?;
    let text = this_text(&this)?;
    let sub = text_arg(&sub, method)?;
    Ok(text.find(&*sub).map(|byte| char_offset(&text, byte)))
}

fn str_find(_rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    Ok(Value::Int(find_in(args, "find")?.map_or(-1, |i| i as i64)))
}

fn str_index(_rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    match find_in(args, "index")? {
        Some(i) => Ok(Value::Int(i as i64)),
        None => Err(ExcType::value_error("substring not found")),
    }
}

fn str_count(_rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, sub] = unpack(args)?;
    let text = this_text(&this)?;
    let sub = text_arg(&sub, "count")?;
    let count = if sub.is_empty() {
        text.chars().count() + 1
    } else {
        text.matches(&*sub).count()
    };
    Ok(Value::Int(count as i64))
}

fn str_replace(_rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, old, new, count] = unpack(args)?;
    let text = this_text(&this)?;
    let old = text_arg(&old, "replace")?;
    let new = text_arg(&new, "replace")?;
    let out = match count.as_int() {
        Some(count) if count >= 0 => text.replacen(&*old, &new, count as usize),
        _ => text.replace(&*old, &new),
    };
    Ok(Value::from(out))
}

fn str_split(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, sep, maxsplit] = unpack(args)?;
    let text = this_text(&this)?;
    let limit = maxsplit.as_int().filter(|n| *n >= 0).map(|n| n as usize);
    let parts: Vec<Value> = if sep.is_none() {
        split_whitespace(&text, limit)
    } else {
        let sep = text_arg(&sep, "split")?;
        if sep.is_empty() {
            return Err(ExcType::value_error("empty separator"));
        }
        match limit {
            Some(n) => text.splitn(n + 1, &*sep).map(Value::from).collect(),
            None => text.split(&*sep).map(Value::from).collect(),
        }
    };
    rt.new_list(parts)
}

/// Splits on runs of whitespace, dropping empty pieces; after `limit` splits the rest is kept
/// whole (minus leading whitespace).
fn split_whitespace(text: &str, limit: Option<usize>) -> Vec<Value> {
    let mut parts = Vec::new();
    let mut rest = text.trim_start();
    while !rest.is_empty() {
        if limit.is_some_and(|n| parts.len() == n) {
            parts.push(Value::from(rest));
            break;
        }
        match rest.find(char::is_whitespace) {
            Some(end) => {
                parts.push(Value::from(&rest[..end]));
                rest = rest[end..].trim_start();
            }
            None => {
                parts.push(Value::from(rest));
                break;
            }
        }
    }
    parts
}

fn str_splitlines(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this] = unpack(args)?;
    let lines = this_text(&this)?.lines().map(Value::from).collect();
    rt.new_list(lines)
}

fn str_join(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, iterable] = unpack(args)?;
    let sep = this_text(&this)?;
    let items = rt.collect(&iterable)?;
    let mut out = String::new();
    for (i, item) in items.iter().enumerate() {
        let Some(text) = text_of(item) else {
            return Err(ExcType::type_error(format!(
                "sequence item {i}: expected string, {} found",
                rt.type_name(item)
            )));
        };
        if i > 0 {
            out.push_str(&sep);
        }
        out.push_str(&text);
    }
    Ok(Value::from(out))
}

pub(crate) fn namespace() -> Namespace {
    let unary = || Signature::new(["self"]);
    let binary = || Signature::new(["self", "other"]);
    let strip_sig = || Signature::new(["self", "chars"]).with_default("chars", Value::None);
    Namespace::new()
        .in_module("__builtin__")
        .method(
            "__init__",
            Signature::new(["self", "item"]).with_default("item", Value::from("")),
            str_init,
        )
        .method("__str__", unary(), str_str)
        .method("__repr__", unary(), str_repr)
        .method("__len__", unary(), str_len)
        .method("__iter__", unary(), str_iter)
        .method("__add__", binary(), str_add)
        .method("__radd__", binary(), str_radd)
        .method("__mul__", binary(), str_mul)
        .method("__rmul__", binary(), str_mul)
        .method("__contains__", Signature::new(["self", "item"]), str_contains)
        .method("__eq__", binary(), |_, args| text_compare(args, |a, b| a == b))
        .method("__ne__", binary(), |_, args| text_compare(args, |a, b| a != b))
        .method("__lt__", binary(), |_, args| text_compare(args, |a, b| a < b))
        .method("__le__", binary(), |_, args| text_compare(args, |a, b| a <= b))
        .method("__gt__", binary(), |_, args| text_compare(args, |a, b| a > b))
        .method("__ge__", binary(), |_, args| text_compare(args, |a, b| a >= b))
        .method("__getitem__", Signature::new(["self", "index"]), str_getitem)
        .method("capitalize", unary(), str_capitalize)
        .method("lower", unary(), str_lower)
        .method("upper", unary(), str_upper)
        .method("title", unary(), str_title)
        .method("strip", strip_sig(), |_, args| strip(args, Strip::Both))
        .method("lstrip", strip_sig(), |_, args| strip(args, Strip::Left))
        .method("rstrip", strip_sig(), |_, args| strip(args, Strip::Right))
        .method("startswith", Signature::new(["self", "prefix"]), str_startswith)
        .method("endswith", Signature::new(["self", "suffix"]), str_endswith)
        .method("find", Signature::new(["self", "sub"]), str_find)
        .method("index", Signature::new(["self", "sub"]), str_index)
        .method("count", Signature::new(["self", "sub"]), str_count)
        .method(
            "replace",
            Signature::new(["self", "old", "new", "count"]).with_default("count", Value::Int(-1)),
            str_replace,
        )
        .method(
            "split",
            Signature::new(["self", "sep", "maxsplit"])
                .with_default("sep", Value::None)
                .with_default("maxsplit", Value::Int(-1)),
            str_split,
        )
        .method("splitlines", unary(), str_splitlines)
        .method("join", Signature::new(["self", "iterable"]), str_join)
}

impl Runtime {
    /// Creates a `str` instance wrapping `text`.
    pub fn new_str(&mut self, text: &str) -> RunResult<Value> {
        let inst = self.allocate_instance(self.builtins.str, Payload::Str(Rc::from(text)))?;
        Ok(Value::Instance(inst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(values: &[Value]) -> Vec<String> {
        values.iter().map(|v| text_of(v).unwrap().to_string()).collect()
    }

    #[test]
    fn whitespace_split_drops_empty_pieces() {
        assert_eq!(texts(&split_whitespace("  a  b\tc \n", None)), ["a", "b", "c"]);
    }

    #[test]
    fn whitespace_split_honours_the_limit() {
        assert_eq!(texts(&split_whitespace(" a b  c d", Some(2))), ["a", "b", "c d"]);
    }

    #[test]
    fn repr_picks_the_quote_that_needs_no_escaping() {
        assert_eq!(quote("abc"), "'abc'");
        assert_eq!(quote("it's"), "\"it's\"");
        assert_eq!(quote("a'b\"c"), "'a\\'b\"c'");
        assert_eq!(quote("line\n"), "'line\\n'");
    }
}
