use core::cmp::Ordering;

/// A strict weak ordering over keys.
///
/// Lookups take a borrowed form `Q` of the stored key, so a comparator is implemented for every
/// `Q` it can order. Any `Fn(&Q, &Q) -> Ordering` closure is a comparator.
pub trait Comparator<Q: ?Sized> {
    fn compare(&self, a: &Q, b: &Q) -> Ordering;
}

/// Orders keys by their [`Ord`] implementation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Natural;

impl<Q: Ord + ?Sized> Comparator<Q> for Natural {
    #[inline]
    fn compare(&self, a: &Q, b: &Q) -> Ordering {
        a.cmp(b)
    }
}

/// Inverts another comparator.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Reversed<C = Natural>(pub C);

impl<Q: ?Sized, C: Comparator<Q>> Comparator<Q> for Reversed<C> {
    #[inline]
    fn compare(&self, a: &Q, b: &Q) -> Ordering {
        self.0.compare(b, a)
    }
}

impl<Q: ?Sized, F> Comparator<Q> for F
where
    F: Fn(&Q, &Q) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &Q, b: &Q) -> Ordering {
        self(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reversed_natural() {
        assert_eq!(Natural.compare(&1, &2), Ordering::Less);
        assert_eq!(Reversed(Natural).compare(&1, &2), Ordering::Greater);
        assert_eq!(Reversed(Natural).compare("b", "b"), Ordering::Equal);
    }

    #[test]
    fn closure() {
        let by_abs = |a: &i32, b: &i32| a.abs().cmp(&b.abs());
        assert_eq!(by_abs.compare(&-3, &2), Ordering::Greater);
        assert_eq!(by_abs.compare(&-2, &2), Ordering::Equal);
    }
}
