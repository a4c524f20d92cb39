#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    if let Ok(mol) = regchem_chem::parse_smiles(data) {
        let _ = regchem_chem::canonical_smiles(&mol);
        let _ = regchem_chem::fragments(&mol);
    }
    let _ = regchem_chem::parse_smarts(data);
});
