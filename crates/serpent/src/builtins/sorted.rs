//! Implementation of the sorted() builtin function and the sort shared with `list.sort`.

use crate::{
    Runtime,
    exception_private::RunResult,
    function::unpack,
    value::Value,
};

/// Implementation of the sorted() builtin function.
///
/// Returns a new list with the items of the iterable in ascending order. `cmp` is an
/// old-style comparison function returning a negative, zero or positive number; `key`
/// maps items to the values compared.
pub fn builtin_sorted(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [iterable, cmp, key, reverse] = unpack(args)?;
    let items = rt.collect(&iterable)?;
    let reverse = rt.truthy(&reverse)?;
    let sorted = sort_values(rt, items, &cmp, &key, reverse)?;
    rt.new_list(sorted)
}

/// Stable sort of `items`. `None` for `cmp` and `key` means natural `<` ordering.
///
/// `reverse` keeps equal items in their original order, as if the comparison were
/// inverted rather than the result reversed.
pub(crate) fn sort_values(
    rt: &mut Runtime,
    items: Vec<Value>,
    cmp: &Value,
    key: &Value,
    reverse: bool,
) -> RunResult<Vec<Value>> {
    let keyed = if key.is_none() {
        items.into_iter().map(|item| (item.clone(), item)).collect()
    } else {
        let mut keyed = Vec::with_capacity(items.len());
        for item in items {
            keyed.push((rt.call(key, vec![item.clone()])?, item));
        }
        keyed
    };
    let mut less = |rt: &mut Runtime, a: &(Value, Value), b: &(Value, Value)| -> RunResult<bool> {
        let (a, b) = if reverse { (&b.0, &a.0) } else { (&a.0, &b.0) };
        if cmp.is_none() {
            return rt.lt(a, b);
        }
        let order = rt.call(cmp, vec![a.clone(), b.clone()])?;
        Ok(order.as_number().is_some_and(|n| n.as_f64() < 0.0))
    };
    let sorted = merge_sort(rt, keyed, &mut less)?;
    Ok(sorted.into_iter().map(|(_, item)| item).collect())
}

/// Top-down merge sort with a fallible comparison; takes the left element on ties.
fn merge_sort<T, F>(rt: &mut Runtime, mut items: Vec<T>, less: &mut F) -> RunResult<Vec<T>>
where
    T: Clone,
    F: FnMut(&mut Runtime, &T, &T) -> RunResult<bool>,
{
    if items.len() <= 1 {
        return Ok(items);
    }
    let right = items.split_off(items.len() / 2);
    let left = merge_sort(rt, items, less)?;
    let right = merge_sort(rt, right, less)?;
    let mut merged = Vec::with_capacity(left.len() + right.len());
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        if less(rt, &right[j], &left[i])? {
            merged.push(right[j].clone());
            j += 1;
        } else {
            merged.push(left[i].clone());
            i += 1;
        }
    }
    merged.extend_from_slice(&left[i..]);
    merged.extend_from_slice(&right[j..]);
    Ok(merged)
}
