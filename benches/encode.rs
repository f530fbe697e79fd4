use criterion::{criterion_group, criterion_main, Criterion};
use garbled_cuckoo::{BuildOptions,Dokvs,DokvsType,FieldModule,ValueModule,encode_with_retries};
use ark_bls12_381::Fr;
use rand::{Rng,SeedableRng};
use rand::rngs::StdRng;
use std::collections::HashMap;

criterion_group!{
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = criterion_benchmark
}
fn criterion_benchmark(crit: &mut Criterion) {
    let sizes = vec![1000usize,10000,100000];
    let module = FieldModule::<Fr>::new();
    let kinds = [DokvsType::H2TwoCoreGct, DokvsType::H3SingletonGct, DokvsType::H3SparseClusterGct];
    for size in sizes {
        /* It's fine to use the same keys every time, due to the random hash key */
        let mut seed = [0u8;32];
        seed[0..4].copy_from_slice(&(size as u32).to_le_bytes());
        let mut rng : StdRng = SeedableRng::from_seed(seed);
        let mut map = HashMap::new();
        while map.len() < size { map.insert(rng.gen::<u64>(), module.random(&mut rng)); }
        let keys : Vec<u64> = map.keys().copied().collect();

        for kind in kinds {
            for parallel in [false, true] {
                /* Bench encoding */
                let mut built = None;
                let mut total_tries = 0;
                let mut total_builds = 0;
                let mut options = BuildOptions { parallel_encode: parallel, ..BuildOptions::default() };
                options.key_gen = Some(seed[..16].try_into().unwrap());
                crit.bench_function(&format!("{:?} encode {} parallel={}",kind,size,parallel),
                    |crit| crit.iter(|| {
                        options.try_num = 0;
                        let result = encode_with_retries(kind, size, &module, &map, &mut options, &mut rng);
                        assert!(result.is_ok()); /* Assert success */
                        built = result.ok();
                        total_tries += options.try_num + 1;
                        total_builds += 1;
                    }));
                println!("{:?} encoding for size {} success rate {}%", kind, size,
                    total_builds as f64 * 100. / total_tries as f64);

                /* Bench decoding */
                if let (false, Some((_, dokvs, storage))) = (parallel, built) {
                    let mut qi = 0;
                    crit.bench_function(&format!("{:?} decode {}",kind,size),
                        |crit| crit.iter(|| {
                            assert_eq!(dokvs.decode(&storage, &keys[qi]).unwrap(), map[&keys[qi]]);
                            qi = (qi+1) % keys.len();
                        }));
                }
            }
        }
    }
}
criterion_main!(benches);
