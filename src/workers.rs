#[cfg(feature = "threaded")]
pub use self::pooled::Workers;

#[cfg(feature = "threaded")]
mod pooled {
    use crate::block::Matrix;

    /// One worker per lane, joined at each slice boundary. A single lane
    /// needs no pool at all.
    pub struct Workers(u32, Option<scoped_threadpool::Pool>);

    impl Workers {
        #[inline(always)]
        pub fn new(lanes: u32) -> Workers {
            match lanes {
                1 => Workers(lanes, None),
                n => Workers(lanes, Some(scoped_threadpool::Pool::new(n))),
            }
        }

        #[inline(always)]
        pub fn map<F>(&mut self, blocks: &mut Matrix, fill_lane: &F)
            where F: Fn(&mut Matrix, u32) + Sync
        {
            match self {
                &mut Workers(1, _) => fill_lane(blocks, 0),
                &mut Workers(lanes, Some(ref mut pool)) => {
                    pool.scoped(|sc| {
                        for lane in 0..lanes {
                            let m = unsafe { blocks.mut_ref() };
                            sc.execute(move || fill_lane(m, lane));
                        }
                    })
                }
                _ => unreachable!(),
            }
        }
    }
}

#[cfg(not(feature = "threaded"))]
pub use self::serial::Workers;

#[cfg(not(feature = "threaded"))]
mod serial {
    use crate::block::Matrix;

    /// Holds the number of lanes. Lanes are filled one after another; the
    /// output is identical to the pooled build.
    pub struct Workers(u32);

    impl Workers {
        #[inline(always)]
        pub fn new(lanes: u32) -> Workers { Workers(lanes) }

        #[inline(always)]
        pub fn map<F>(&mut self, blocks: &mut Matrix, fill_lane: &F)
            where F: Fn(&mut Matrix, u32) + Sync
        {
            for lane in 0..self.0 {
                fill_lane(blocks, lane);
            }
        }
    }
}
