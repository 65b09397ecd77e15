//! Slot allocation within an account's capacity.

use std::collections::HashSet;

/// Every slot in `1..=max_customers` not already taken, ascending.
pub fn available_slots<I>(max_customers: u32, used: I) -> Vec<u32>
where
    I: IntoIterator<Item = u32>,
{
    let used: HashSet<u32> = used.into_iter().collect();
    (1..=max_customers).filter(|slot| !used.contains(slot)).collect()
}

pub fn first_available_slot<I>(max_customers: u32, used: I) -> Option<u32>
where
    I: IntoIterator<Item = u32>,
{
    available_slots(max_customers, used).into_iter().next()
}

/// Why a requested slot cannot be assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotRejection {
    OutOfRange { max_customers: u32 },
    Taken,
}

/// Check that `requested` lies within capacity and is not in `used`.
pub fn check_slot<I>(max_customers: u32, used: I, requested: u32) -> Result<(), SlotRejection>
where
    I: IntoIterator<Item = u32>,
{
    if requested == 0 || requested > max_customers {
        return Err(SlotRejection::OutOfRange { max_customers });
    }
    if used.into_iter().any(|slot| slot == requested) {
        return Err(SlotRejection::Taken);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_free_slots_in_order() {
        assert_eq!(available_slots(5, vec![2, 4]), vec![1, 3, 5]);
        assert_eq!(available_slots(3, vec![1, 2, 3]), Vec::<u32>::new());
        assert_eq!(available_slots(0, Vec::new()), Vec::<u32>::new());
    }

    #[test]
    fn slots_beyond_capacity_do_not_count() {
        // A slot left over from a larger capacity does not free anything.
        assert_eq!(available_slots(2, vec![7]), vec![1, 2]);
    }

    #[test]
    fn first_slot_skips_taken() {
        assert_eq!(first_available_slot(4, vec![1, 2]), Some(3));
        assert_eq!(first_available_slot(1, vec![1]), None);
    }

    #[test]
    fn check_slot_rejects_range_and_duplicates() {
        assert_eq!(check_slot(4, vec![1], 2), Ok(()));
        assert_eq!(check_slot(4, vec![1], 1), Err(SlotRejection::Taken));
        assert_eq!(
            check_slot(4, vec![], 5),
            Err(SlotRejection::OutOfRange { max_customers: 4 })
        );
        assert_eq!(
            check_slot(4, vec![], 0),
            Err(SlotRejection::OutOfRange { max_customers: 4 })
        );
    }
}
